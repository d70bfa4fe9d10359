use serde_json::{json, Value};
use std::sync::LazyLock;

/// Structural schema of a `skill.json` manifest. Field presence is checked
/// separately so each missing field gets its own check.
pub static MANIFEST_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "properties": {
            "name": { "type": "string", "minLength": 1 },
            "version": { "type": "string" },
            "description": { "type": "string" },
            "main": { "type": "string" },
            "author": {
                "oneOf": [
                    { "type": "string" },
                    {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "email": { "type": "string" },
                            "url": { "type": "string" }
                        }
                    }
                ]
            },
            "repository": {
                "oneOf": [
                    { "type": "string" },
                    {
                        "type": "object",
                        "properties": {
                            "type": { "type": "string" },
                            "url": { "type": "string" }
                        }
                    }
                ]
            },
            "permissions": {
                "oneOf": [
                    { "type": "null" },
                    { "type": "string" },
                    { "type": "array", "items": { "type": "string" } },
                    {
                        "type": "object",
                        "additionalProperties": {
                            "oneOf": [
                                { "type": "array", "items": { "type": "string" } },
                                { "type": "string" },
                                { "type": "boolean" }
                            ]
                        }
                    }
                ]
            }
        }
    })
});
