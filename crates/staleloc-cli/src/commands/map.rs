use super::Context;
use staleloc_services::PathMapper;

pub fn run_map(
    ctx: &Context,
    path: &str,
    lang: &str,
    source_lang: Option<String>,
) -> color_eyre::Result<()> {
    let mapper = PathMapper::new(ctx.source_lang(source_lang));
    let translated = mapper.derive_translation_path(path, lang)?;
    println!("{translated}");
    Ok(())
}
