use super::Context;
use std::fs;
use std::path::PathBuf;

pub fn run_schema(ctx: &Context, out_dir: PathBuf) -> color_eyre::Result<()> {
    let out_dir = if out_dir.as_os_str().is_empty() {
        ctx.config
            .output
            .as_ref()
            .and_then(|o| o.out_dir.as_deref())
            .map(|d| PathBuf::from(d).join("schemas"))
            .unwrap_or_else(|| PathBuf::from("./docs/schemas"))
    } else {
        out_dir
    };
    fs::create_dir_all(&out_dir)?;
    macro_rules! dump {
        ($ty:ty, $name:literal) => {{
            let schema = schemars::schema_for!($ty);
            let path = out_dir.join($name);
            let f = std::fs::File::create(&path)?;
            serde_json::to_writer_pretty(f, &schema)?;
        }};
    }
    dump!(staleloc_domain::RunReport, "run_report.schema.json");
    dump!(staleloc_domain::BundleOut, "bundle.schema.json");
    dump!(staleloc_domain::LanguageOut, "language.schema.json");
    dump!(staleloc_domain::FailureOut, "failure.schema.json");
    tracing::info!(event = "schemas_dumped", path = %out_dir.display());
    println!("✔ Schemas written to {}", out_dir.display());
    Ok(())
}
