use std::collections::BTreeSet;

use combo_contracts::history::StyleVariant;
use rand::Rng;

use crate::select::pick;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub name: String,
    pub background: String,
    pub accent: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleTheme {
    pub name: String,
    pub typography: Vec<String>,
    pub palettes: Vec<Palette>,
    pub surfaces: Vec<String>,
    pub spacing: Vec<String>,
}

/// Theme-independent decoration pools, each sampled once per variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecorativePools {
    pub radius: Vec<String>,
    pub gradient_directions: Vec<String>,
    pub gradient_stops: Vec<String>,
    pub glows: Vec<String>,
    pub layouts: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct StyleCatalog {
    themes: Vec<StyleTheme>,
    decorative: DecorativePools,
}

impl Default for StyleCatalog {
    fn default() -> Self {
        Self::new(default_themes(), default_decorative_pools())
    }
}

impl StyleCatalog {
    pub fn new(themes: Vec<StyleTheme>, decorative: DecorativePools) -> Self {
        Self { themes, decorative }
    }

    /// One random variant: a theme, one of its palettes, one token from each of
    /// its pools, plus one token from each decorative pool. Empty pools are
    /// skipped; a catalog without any theme/palette yields `None`.
    pub fn sample_variant<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<StyleVariant> {
        let theme = pick(&self.themes, rng)?;
        let palette = pick(&theme.palettes, rng)?;

        let mut class_tokens = BTreeSet::new();
        insert_tokens(&mut class_tokens, &palette.background);
        insert_tokens(&mut class_tokens, &palette.accent);
        let pools = [
            &theme.typography,
            &theme.surfaces,
            &theme.spacing,
            &self.decorative.radius,
            &self.decorative.gradient_directions,
            &self.decorative.gradient_stops,
            &self.decorative.glows,
            &self.decorative.layouts,
        ];
        for pool in pools {
            if let Some(entry) = pick(pool, rng) {
                insert_tokens(&mut class_tokens, entry);
            }
        }

        Some(StyleVariant {
            label: format!("{} / {}", theme.name, palette.name),
            theme_name: theme.name.clone(),
            palette_name: palette.name.clone(),
            class_tokens,
        })
    }
}

/// Pool entries may hold several space-separated classes.
fn insert_tokens(tokens: &mut BTreeSet<String>, entry: &str) {
    tokens.extend(entry.split_whitespace().map(str::to_string));
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn palette(name: &str, background: &str, accent: &str) -> Palette {
    Palette {
        name: name.to_string(),
        background: background.to_string(),
        accent: accent.to_string(),
    }
}

pub fn default_decorative_pools() -> DecorativePools {
    DecorativePools {
        radius: strings(&["rounded-none", "rounded-md", "rounded-xl", "rounded-3xl", "rounded-full"]),
        gradient_directions: strings(&[
            "bg-gradient-to-r",
            "bg-gradient-to-br",
            "bg-gradient-to-b",
            "bg-gradient-to-tr",
        ]),
        gradient_stops: strings(&[
            "via-white/5",
            "via-white/20",
            "via-black/10",
            "to-transparent",
        ]),
        glows: strings(&[
            "shadow-indigo-500/30",
            "shadow-emerald-400/30",
            "shadow-rose-500/25",
            "shadow-amber-300/30",
            "shadow-cyan-400/30",
        ]),
        layouts: strings(&["gap-4", "gap-8", "space-y-6", "space-y-12", "max-w-5xl", "max-w-7xl"]),
    }
}

pub fn default_themes() -> Vec<StyleTheme> {
    vec![
        StyleTheme {
            name: "Neo Brutalist".to_string(),
            typography: strings(&["font-mono uppercase", "font-black tracking-tight"]),
            palettes: vec![
                palette("Signal", "bg-yellow-300", "text-black"),
                palette("Concrete", "bg-stone-200", "text-red-600"),
                palette("Riot", "bg-lime-300", "text-fuchsia-700"),
            ],
            surfaces: strings(&["border-4 border-black", "shadow-[8px_8px_0_0_#000]"]),
            spacing: strings(&["p-6", "p-10"]),
        },
        StyleTheme {
            name: "Glassmorphism".to_string(),
            typography: strings(&["font-light tracking-wide", "font-medium"]),
            palettes: vec![
                palette("Aurora", "bg-slate-900", "text-sky-300"),
                palette("Frost", "bg-sky-100", "text-indigo-700"),
            ],
            surfaces: strings(&["backdrop-blur-xl bg-white/10", "backdrop-blur-md ring-1 ring-white/20"]),
            spacing: strings(&["p-8", "px-12 py-16"]),
        },
        StyleTheme {
            name: "Editorial Serif".to_string(),
            typography: strings(&["font-serif leading-relaxed", "font-serif italic"]),
            palettes: vec![
                palette("Ink", "bg-stone-50", "text-stone-900"),
                palette("Sepia", "bg-amber-50", "text-amber-900"),
                palette("Newsprint", "bg-neutral-100", "text-neutral-800"),
            ],
            surfaces: strings(&["border-y border-stone-300", "divide-y divide-stone-200"]),
            spacing: strings(&["py-20", "py-12 px-6"]),
        },
        StyleTheme {
            name: "Midnight Neon".to_string(),
            typography: strings(&["font-sans font-bold", "font-mono"]),
            palettes: vec![
                palette("Cyber", "bg-zinc-950", "text-fuchsia-400"),
                palette("Synthwave", "bg-indigo-950", "text-pink-400"),
            ],
            surfaces: strings(&["ring-1 ring-fuchsia-500/40", "border border-cyan-400/30"]),
            spacing: strings(&["p-6", "p-12"]),
        },
        StyleTheme {
            name: "Soft Pastel".to_string(),
            typography: strings(&["font-rounded", "font-sans font-medium"]),
            palettes: vec![
                palette("Peach", "bg-orange-50", "text-rose-500"),
                palette("Mint", "bg-emerald-50", "text-teal-600"),
                palette("Lilac", "bg-violet-50", "text-violet-600"),
            ],
            surfaces: strings(&["shadow-sm", "ring-1 ring-black/5"]),
            spacing: strings(&["p-8", "p-14"]),
        },
        StyleTheme {
            name: "Corporate Clean".to_string(),
            typography: strings(&["font-sans", "font-sans tracking-tight"]),
            palettes: vec![
                palette("Trust", "bg-white", "text-blue-700"),
                palette("Slate", "bg-slate-50", "text-slate-900"),
            ],
            surfaces: strings(&["border border-slate-200", "shadow-md"]),
            spacing: strings(&["p-6", "px-8 py-10"]),
        },
    ]
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::{palette, strings, DecorativePools, StyleCatalog, StyleTheme};

    fn single_option_catalog() -> StyleCatalog {
        StyleCatalog::new(
            vec![StyleTheme {
                name: "Mono".to_string(),
                typography: strings(&["font-sans"]),
                palettes: vec![palette("Plain", "bg-white", "text-black")],
                surfaces: strings(&["shadow-none"]),
                spacing: strings(&["p-4"]),
            }],
            DecorativePools {
                radius: strings(&["rounded-md"]),
                gradient_directions: strings(&["bg-gradient-to-r"]),
                gradient_stops: strings(&["to-transparent"]),
                glows: strings(&["shadow-cyan-400/30"]),
                layouts: strings(&["gap-4"]),
            },
        )
    }

    #[test]
    fn variant_samples_one_token_per_pool() {
        let mut rng = StdRng::seed_from_u64(2);
        let variant = single_option_catalog().sample_variant(&mut rng);
        let Some(variant) = variant else {
            panic!("expected a variant");
        };
        assert_eq!(variant.label, "Mono / Plain");
        assert_eq!(variant.class_tokens.len(), 10);
        assert!(variant.class_tokens.contains("bg-white"));
        assert!(variant.class_tokens.contains("gap-4"));
    }

    #[test]
    fn default_catalog_variants_belong_to_their_theme() {
        let catalog = StyleCatalog::default();
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..25 {
            let Some(variant) = catalog.sample_variant(&mut rng) else {
                panic!("default catalog must always sample");
            };
            let theme = catalog
                .themes
                .iter()
                .find(|theme| theme.name == variant.theme_name);
            let Some(theme) = theme else {
                panic!("unknown theme {}", variant.theme_name);
            };
            let palette = theme
                .palettes
                .iter()
                .find(|palette| palette.name == variant.palette_name);
            assert!(palette.is_some_and(|palette| variant.class_tokens.contains(&palette.background)));
        }
    }

    #[test]
    fn empty_catalog_yields_no_variant() {
        let mut rng = StdRng::seed_from_u64(2);
        let catalog = StyleCatalog::new(Vec::new(), super::default_decorative_pools());
        assert!(catalog.sample_variant(&mut rng).is_none());
    }
}
