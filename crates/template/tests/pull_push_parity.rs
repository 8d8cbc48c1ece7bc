use template::debug::{event_lines, pull_event_lines};
use template::{CompiledHtml, Html, Node, Template, attribute, element};
use template_test_support::diff_lines;
use template_test_support::outline;

/// Small deterministic generator, so failures reproduce from the seed.
struct Lcg(u64);

impl Lcg {
    fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) as u32
    }

    fn below(&mut self, n: u32) -> u32 {
        self.next_u32() % n
    }
}

const BLOCKS: [template::ElementName; 4] = [element::DIV, element::P, element::UL, element::SECTION];
const INLINE: [template::ElementName; 3] = [element::SPAN, element::EM, element::A];

fn generate(h: &Html, rng: &mut Lcg, depth: u32) -> template::Instruction {
    let mut args = Vec::new();
    for _ in 0..rng.below(3) {
        args.push(match rng.below(4) {
            0 => h.id(&format!("n{}", rng.next_u32())),
            1 => h.class("c"),
            2 => h.bool_attr(attribute::HIDDEN),
            _ => h.attr(attribute::TITLE, "t<\"'&"),
        });
    }
    let children = if depth == 0 { 0 } else { rng.below(4) };
    for _ in 0..children {
        args.push(match rng.below(6) {
            0 => h.text("text & more"),
            1 => h.raw("<!-- r -->"),
            2 => h.element(element::BR, &[]),
            3 => {
                let inner = generate(h, rng, depth - 1);
                h.flatten(&[inner, h.text("after")])
            }
            _ => generate(h, rng, depth - 1),
        });
    }
    let name = if rng.below(2) == 0 {
        BLOCKS[rng.below(BLOCKS.len() as u32) as usize]
    } else {
        INLINE[rng.below(INLINE.len() as u32) as usize]
    };
    h.element(name, &args)
}

fn generated(seed: u64) -> CompiledHtml {
    let h = Html::new();
    let mut rng = Lcg(seed);
    for _ in 0..1 + rng.below(3) {
        generate(&h, &mut rng, 5);
    }
    h.finish().compile()
}

fn assert_parity(html: &CompiledHtml, label: &str) {
    let pushed = event_lines(html);
    let pulled = pull_event_lines(html);
    assert!(
        pushed == pulled,
        "pull/push mismatch for {label}:\n{}",
        diff_lines(&pushed, &pulled)
    );
}

#[test]
fn generated_documents_pull_like_they_push() {
    for seed in 0..200 {
        assert_parity(&generated(seed), &format!("seed {seed}"));
    }
}

#[test]
fn eager_and_call_order_recordings_compile_identically() {
    let eager = {
        let h = Html::new();
        h.element(
            element::UL,
            &[
                h.class("list"),
                h.element_text(element::LI, "one"),
                h.element(element::LI, &[h.bool_attr(attribute::HIDDEN), h.text("two")]),
            ],
        );
        h.finish().compile()
    };
    let call_order = outline::compiled("<ul class=\"list\">\n  <li>\n    \"one\"\n  <li hidden>\n    \"two\"\n");
    assert_eq!(eager.code(), call_order.code());
    assert_eq!(eager.to_string(), call_order.to_string());
    assert_parity(&eager, "eager list");
}

struct Card<'a> {
    title: &'a str,
    body: &'a str,
}

impl Template for Card<'_> {
    fn render(&self, h: &Html) {
        h.element(
            element::SECTION,
            &[
                h.class("card"),
                h.element_text(element::H1, self.title),
                h.element_text(element::P, self.body),
            ],
        );
    }
}

#[test]
fn included_templates_nest_at_the_call_site() {
    let card = Card {
        title: "T",
        body: "B",
    };
    let h = Html::new();
    h.element(element::MAIN, &[h.template(&card), h.template(&card)]);
    let html = h.finish().compile();
    assert_eq!(
        html.to_string(),
        "<main><section class=\"card\"><h1>T</h1><p>B</p></section>\
         <section class=\"card\"><h1>T</h1><p>B</p></section></main>"
    );
    assert_parity(&html, "cards");
}

#[test]
fn partial_pull_traversal_skips_subtrees() {
    let html = generated(7);
    let mut roots = 0;
    for node in html.pull() {
        if let Node::Element(e) = node {
            roots += 1;
            // Never descend: the next sibling must still come out.
            let _ = e.name();
        }
    }
    assert!(roots >= 1);
}
