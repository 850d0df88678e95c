//! Parameterised layout blocks used to synthesize structural templates when a
//! category has no template file yet. `{category}` and `{index}` are replaced at
//! synthesis time.

pub const MIN_BLOCKS_PER_TEMPLATE: usize = 4;
pub const MAX_BLOCKS_PER_TEMPLATE: usize = 6;

pub const LAYOUT_BLOCKS: &[&str] = &[
    r##"<header class="flex items-center justify-between"><a class="font-semibold" href="/">{category}</a><nav class="flex gap-6"><a href="#features">Features</a><a href="#pricing">Pricing</a><a href="#contact">Contact</a></nav></header>"##,
    r##"<section class="hero text-center"><h1 class="text-5xl font-bold">{category} concept {index}</h1><p class="mt-4 text-lg">A focused starting point for the {category} experience.</p><div class="mt-8 flex justify-center gap-4"><a class="btn-primary" href="#start">Get started</a><a class="btn-ghost" href="#learn">Learn more</a></div></section>"##,
    r##"<section class="grid md:grid-cols-3 gap-6"><article class="card"><h3>Fast</h3><p>Built for {category} teams.</p></article><article class="card"><h3>Clear</h3><p>Readable at a glance.</p></article><article class="card"><h3>Flexible</h3><p>Variant {index} adapts.</p></article></section>"##,
    r##"<section class="split grid md:grid-cols-2 items-center"><figure class="media"><img src="/placeholder-{index}.png" alt="{category} preview" /></figure><div class="copy"><h2 class="text-3xl">Why {category}</h2><ul class="checklist"><li>Composable sections</li><li>Accessible defaults</li><li>Responsive grid</li></ul></div></section>"##,
    r##"<section class="stats grid grid-cols-2 md:grid-cols-4"><dl><dt>Users</dt><dd>12k</dd></dl><dl><dt>Uptime</dt><dd>99.9%</dd></dl><dl><dt>Pages</dt><dd>{index}</dd></dl><dl><dt>Teams</dt><dd>340</dd></dl></section>"##,
    r##"<section class="testimonial"><blockquote class="text-xl italic"><p>"The {category} layout shipped in a day."</p><footer><cite>Design lead</cite></footer></blockquote></section>"##,
    r##"<section class="pricing grid md:grid-cols-3"><div class="tier"><h3>Starter</h3><p class="price">$0</p><button class="btn-ghost">Choose</button></div><div class="tier featured"><h3>Pro</h3><p class="price">$29</p><button class="btn-primary">Choose</button></div><div class="tier"><h3>Scale</h3><p class="price">Custom</p><button class="btn-ghost">Talk to us</button></div></section>"##,
    r##"<section class="faq"><h2>Questions about {category}</h2><details><summary>Is variant {index} responsive?</summary><p>Yes, every breakpoint is covered.</p></details><details><summary>Can I theme it?</summary><p>Swap the style tokens.</p></details></section>"##,
    r##"<section class="gallery columns-2 md:columns-3"><figure><img src="/shot-a.png" alt="" /><figcaption>Detail A</figcaption></figure><figure><img src="/shot-b.png" alt="" /><figcaption>Detail B</figcaption></figure><figure><img src="/shot-c.png" alt="" /><figcaption>Detail C</figcaption></figure></section>"##,
    r##"<section class="timeline"><ol class="steps"><li><h4>Plan</h4><p>Outline the {category}.</p></li><li><h4>Build</h4><p>Assemble block {index}.</p></li><li><h4>Launch</h4><p>Ship it.</p></li></ol></section>"##,
    r##"<section class="cta text-center"><h2 class="text-2xl">Ready to try this {category}?</h2><form class="mt-6 flex gap-2"><label class="sr-only" for="email-{index}">Email</label><input id="email-{index}" type="email" placeholder="you@example.com" /><button class="btn-primary" type="submit">Join</button></form></section>"##,
    r##"<section class="table-wrap overflow-x-auto"><table class="w-full"><thead><tr><th>Feature</th><th>Included</th></tr></thead><tbody><tr><td>{category} sections</td><td>Yes</td></tr><tr><td>Variant {index}</td><td>Yes</td></tr></tbody></table></section>"##,
    r##"<aside class="sidebar"><h4>On this page</h4><ul class="toc"><li><a href="#intro">Intro</a></li><li><a href="#usage">Usage</a></li></ul></aside>"##,
    r##"<footer class="border-t"><div class="grid md:grid-cols-3"><p>&copy; {category}</p><nav><a href="/privacy">Privacy</a><a href="/terms">Terms</a></nav><small>Build {index}</small></div></footer>"##,
];

pub fn render_block(block: &str, category: &str, index: usize) -> String {
    block
        .replace("{category}", category)
        .replace("{index}", &index.to_string())
}

#[cfg(test)]
mod tests {
    use super::{render_block, LAYOUT_BLOCKS, MAX_BLOCKS_PER_TEMPLATE};

    #[test]
    fn library_is_larger_than_one_template() {
        assert!(LAYOUT_BLOCKS.len() > MAX_BLOCKS_PER_TEMPLATE);
    }

    #[test]
    fn render_interpolates_all_placeholders() {
        for block in LAYOUT_BLOCKS {
            let rendered = render_block(block, "Portfolio", 7);
            assert!(!rendered.contains("{category}"));
            assert!(!rendered.contains("{index}"));
        }
    }
}
