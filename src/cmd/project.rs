//! Project initialization (`gavel init`).

use anyhow::Result;

pub fn cmd_init(project_dir: &std::path::Path) -> Result<()> {
    use gavel::init::init_project;

    let result = init_project(project_dir)?;

    if result.created {
        println!(
            "Initialized gavel project at {}",
            result.gavel_dir.display()
        );
        println!();
        println!("Created directory structure:");
        println!("  .gavel/");
        println!("  ├── gavel.toml   # Configuration (use `gavel config show`)");
        println!("  └── store/       # Decision history and UI state");
        println!();
        println!("Next steps:");
        println!("  1. Write a review request as JSON");
        println!("  2. Run `gavel review <request.json>`");
        println!("  3. Run `gavel history` to see past decisions");
    } else {
        println!(
            "Gavel project already initialized at {}",
            result.gavel_dir.display()
        );
        println!("Directory structure verified.");
    }

    Ok(())
}
