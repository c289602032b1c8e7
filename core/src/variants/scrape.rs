use std::sync::LazyLock;

use regex::Regex;

use super::Variant;

/// `href="https://<host>/sprites/<game>/shiny/<name>.png"`, optionally with a
/// query or fragment after `.png`. The image URL stops at `.png`.
static SHINY_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"href="(https://[^"]*?/sprites/([^"]+?)/shiny/([^"/?#]+?)\.png)[^"]*""#)
        .expect("shiny link pattern is valid")
});

/// Pull the shiny sprite links out of a sprite page.
///
/// Labels are `"<game>: <name>"`. Links without a `shiny` path segment are
/// ignored; when two links produce the same label the first one wins.
pub fn shiny_variants(page: &str) -> Vec<Variant> {
    let mut variants: Vec<Variant> = Vec::new();

    for caps in SHINY_LINK.captures_iter(page) {
        let label = format!("{}: {}", &caps[2], &caps[3]);
        if variants.iter().any(|v| v.label == label) {
            continue;
        }
        variants.push(Variant {
            label,
            image_url: caps[1].to_string(),
        });
    }

    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<a href="https://img.pokemondb.net/sprites/scarlet-violet/normal/pikachu.png">normal</a>
<a href="https://img.pokemondb.net/sprites/scarlet-violet/shiny/pikachu.png">shiny</a>
<a href="https://img.pokemondb.net/sprites/home/shiny/pikachu.png">home</a>
<a href="https://img.pokemondb.net/sprites/home/shiny/pikachu-gmax.png">gmax</a>
<a href="https://img.pokemondb.net/sprites/black-white/anim/shiny/pikachu.gif">anim</a>
<a href="https://img.pokemondb.net/sprites/home/shiny/pikachu.png">dupe</a>
<img src="https://img.pokemondb.net/sprites/x-y/shiny/pikachu.png">
"#;

    #[test]
    fn test_only_shiny_png_links() {
        let variants = shiny_variants(PAGE);
        let labels: Vec<_> = variants.iter().map(|v| v.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "scarlet-violet: pikachu",
                "home: pikachu",
                "home: pikachu-gmax"
            ]
        );
        assert_eq!(
            variants[0].image_url,
            "https://img.pokemondb.net/sprites/scarlet-violet/shiny/pikachu.png"
        );
    }

    #[test]
    fn test_nested_game_path_kept_whole() {
        let page = r#"<a href="https://img.pokemondb.net/sprites/sword-shield/icon/shiny/eevee.png">"#;
        let variants = shiny_variants(page);
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].label, "sword-shield/icon: eevee");
    }

    #[test]
    fn test_link_with_query_after_png() {
        let page = r#"<a href="https://img.pokemondb.net/sprites/home/shiny/pikachu.png?v=2">"#;
        let variants = shiny_variants(page);
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].label, "home: pikachu");
        assert_eq!(
            variants[0].image_url,
            "https://img.pokemondb.net/sprites/home/shiny/pikachu.png"
        );
    }

    #[test]
    fn test_page_without_links() {
        assert!(shiny_variants("<html>nothing here</html>").is_empty());
    }
}
