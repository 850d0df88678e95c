mod blocks;
mod structure;
mod style;

pub use blocks::{render_block, LAYOUT_BLOCKS};
pub use structure::{
    synthesize_templates, StructuralTemplate, StructureCatalog, DEFAULT_CATEGORIES,
    DEFAULT_TEMPLATES_PER_CATEGORY,
};
pub use style::{
    default_decorative_pools, default_themes, DecorativePools, Palette, StyleCatalog, StyleTheme,
};
