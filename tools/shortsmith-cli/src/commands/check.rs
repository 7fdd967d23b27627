//! Check the external toolchain and fonts.

use shortsmith_common::{config_file_path, AppConfig};
use shortsmith_render_engine::command_exists;
use shortsmith_render_engine::text::{packaged_families, FontRequest, FontResolver, FontSource};

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Shortsmith System Check");
    println!("{}", "=".repeat(50));

    let mut ready = true;
    for tool in ["ffmpeg", "ffprobe"] {
        if command_exists(tool) {
            println!("[OK] {tool}");
        } else {
            println!("[FAIL] {tool} not found on PATH");
            ready = false;
        }
    }

    println!();
    println!("Fonts directory: {}", config.fonts.fonts_dir.display());
    let resolver = FontResolver::new(&config.fonts);
    for family in packaged_families() {
        let resolved = resolver.resolve(&FontRequest {
            family: family.to_string(),
            weight: 700,
        });
        match &resolved.source {
            FontSource::Packaged(path) => println!("[OK] {family}: {}", path.display()),
            FontSource::System(path) => {
                println!("[WARN] {family}: system fallback {}", path.display())
            }
            FontSource::Bitmap => println!("[WARN] {family}: bitmap fallback only"),
        }
    }

    println!();
    println!("Config file: {}", config_file_path().display());
    println!("Storage root: {}", config.storage_root.display());
    println!("Workspace root: {}", config.workspace_root.display());

    println!();
    if ready {
        println!("All required tools are available. Shortsmith is ready.");
    } else {
        println!("Some required tools are missing. Install ffmpeg to render.");
    }

    Ok(())
}
