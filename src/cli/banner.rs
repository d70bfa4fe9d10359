use console::{style, Term};
use tui_banner::{Align, Banner, ColorMode, Fill, Gradient, GradientDirection, Palette};

/// Ocean palette for the lobster-claw brand.
const BRAND: u8 = 38;       // deep sky blue
const BRAND_DIM: u8 = 24;   // dark steel blue
const DIM: u8 = 240;

const TAGLINE: &str = "Pre-install security scanner for ClawdHub skills";

/// Prints the startup banner. Falls back to a plain title when colour is
/// disabled or FIGlet rendering fails.
pub fn print_banner() {
    let term = Term::stdout();
    let (_, term_cols) = term.size();
    let width = (term_cols as usize).clamp(40, 100);

    let version = env!("CARGO_PKG_VERSION");
    let git_hash = option_env!("GIT_HASH").unwrap_or("dev");

    let rendered = if console::colors_enabled() {
        let palette = Palette::from_hex(&["#AFFFFF", "#5FD7FF", "#0087D7", "#005F87"]);
        let gradient = Gradient::new(palette.colors().to_vec(), GradientDirection::Diagonal);
        Banner::new("CLAWSCAN").ok().map(|b| {
            b.gradient(gradient)
                .fill(Fill::Keep)
                .align(Align::Center)
                .trim_vertical(true)
                .color_mode(ColorMode::TrueColor)
                .width(width)
                .render()
        })
    } else {
        None
    };

    println!();
    match rendered {
        Some(text) => print!("{}", text),
        None => println!("  {}", style("CLAWSCAN").color256(BRAND).bold()),
    }
    println!(
        "  {}  {}",
        style(TAGLINE).white().bold(),
        style(format!("v{} ({})", version, git_hash)).color256(DIM),
    );
    println!("  {}", style("\u{2500}".repeat(width.min(70) - 2)).color256(BRAND_DIM));
}
