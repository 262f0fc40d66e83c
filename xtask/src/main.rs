//! Build automation tasks for bi-seed
//!
//! Currently a single task: regenerating the CLI reference from the clap
//! definitions so the docs never drift from the flags.

use clap::Parser;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation tasks for bi-seed", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Generate the CLI reference in Markdown
    GenerateCliDocs {
        /// Output directory for generated documentation
        #[arg(short, long, default_value = "docs")]
        output_dir: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::GenerateCliDocs { output_dir } => generate_cli_docs(&output_dir)?,
    }

    Ok(())
}

fn generate_cli_docs(output_dir: &str) -> anyhow::Result<()> {
    println!("Generating CLI documentation...");

    let markdown = clap_markdown::help_markdown::<bi_seed_cli::Cli>();

    let content = format!(
        r#"# bi-seed CLI Reference

Generated from the CLI source code on {}.

`bi-seed` waits for a BI web application's API, logs in, registers the
database connections found in `CONNECTION_*` environment variables and
imports `database_*.zip`, `dataset_*.zip`, `chart_*.zip` and
`dashboard_*.zip` bundles, in that order.

## Quick Start

```bash
export SUPERSET_BASE_URL=http://localhost:8089
export CONNECTION_WAREHOUSE='Warehouse:5b1c6f0e-2d7a-4d1f-9a53-0c2f1e4a9b11:postgresql://bi:pw@db:5432/warehouse'

# Development run: no connectivity checks, nothing excluded
bi-seed --artifact-dir ./bundles

# Production run: unreachable databases are skipped, legacy exports excluded
env=prod bi-seed --artifact-dir ./bundles --fail-on-error
```

## Exit Codes

- `0` - run completed (see the summary for per-item failures)
- `1` - API unavailable, authentication failed or invalid configuration
- `2` - `--fail-on-error` was given and a registration or upload failed

## Logging

- `LOG_LEVEL` - trace, debug, info, warn, error (default: `info`, `debug` with `--verbose`)
- `LOG_OUTPUT` - console, file, both
- `LOG_FORMAT` - text, json
- `LOG_DIR`, `LOG_FILE_PREFIX`, `LOG_FILTER`

## Options

{}

---

*To update, run `cargo xtask generate-cli-docs`.*
"#,
        chrono::Utc::now().format("%Y-%m-%d"),
        markdown
    );

    let output_path = PathBuf::from(output_dir);
    fs::create_dir_all(&output_path)?;

    let file_path = output_path.join("cli-reference.md");
    fs::write(&file_path, content)?;

    println!("Generated CLI documentation at: {}", file_path.display());

    Ok(())
}
