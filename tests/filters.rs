//! Filter-level integration tests.
//!
//! A scripted `ToolRunner` stands in for latex and dvisvgm, so these run
//! without a TeX installation. Documents are pandoc JSON ASTs written by
//! hand in the shapes pandoc produces.

use embedmath::ast::{self, Placement};
use embedmath::filter::walk;
use embedmath::pipeline::embed::decode_tex_attribute;
use embedmath::pipeline::markup::first_element;
use embedmath::{
    DecodeState, DecodingFilter, EmbedConfig, EncodingFilter, Invocation, Renderer, ToolOutput,
    ToolRunner,
};
use serde_json::{json, Value};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Writes `target.dvi` for latex and an SVG echoing the scale for dvisvgm.
struct ScriptedTex;

impl ToolRunner for ScriptedTex {
    fn run(&self, inv: &Invocation) -> embedmath::Result<ToolOutput> {
        let dir = inv.cwd.as_ref().expect("renderer always sets cwd");
        if inv.program == "latex" {
            std::fs::write(dir.join("target.dvi"), b"dvi")?;
        } else {
            let scale = inv
                .args
                .iter()
                .find_map(|a| a.strip_prefix("--scale="))
                .unwrap_or("?");
            std::fs::write(
                dir.join("target.svg"),
                format!(r#"<svg data-scale="{scale}"/>"#),
            )?;
        }
        Ok(ToolOutput {
            code: Some(0),
            success: true,
            ..ToolOutput::default()
        })
    }
}

fn encoder() -> EncodingFilter<ScriptedTex> {
    EncodingFilter::new(Renderer::new(ScriptedTex, EmbedConfig::default()))
}

fn math(kind: &str, tex: &str) -> Value {
    json!({"t": "Math", "c": [{"t": kind}, tex]})
}

fn doc(blocks: Value) -> Value {
    json!({"pandoc-api-version": [1, 23], "meta": {}, "blocks": blocks})
}

fn str_node(s: &str) -> Value {
    json!({"t": "Str", "c": s})
}

/// Encode a single math node and return the embed markup.
fn encode_one(kind: &str, tex: &str) -> String {
    let out = walk(doc(json!([{"t": "Para", "c": [math(kind, tex)]}])), &mut encoder()).unwrap();
    let raw = &out["blocks"][0]["c"][0];
    ast::as_raw(raw).expect("raw inline").text.to_string()
}

/// The attribute text recovered from embed markup.
fn recovered(markup: &str) -> String {
    let el = first_element(markup).expect("element");
    decode_tex_attribute(el.attr("embedmath-tex").expect("attribute")).unwrap()
}

// ── Encoding ────────────────────────────────────────────────────────────────

#[test]
fn encodes_inline_math_in_paragraph() {
    let input = doc(json!([{"t": "Para", "c": [
        str_node("Area"), {"t": "Space"}, math("InlineMath", "x^2")
    ]}]));
    let out = walk(input, &mut encoder()).unwrap();

    let para = out["blocks"][0]["c"].as_array().unwrap();
    assert_eq!(para.len(), 3);
    assert_eq!(para[0], str_node("Area"));
    let raw = ast::as_raw(&para[2]).unwrap();
    assert_eq!(raw.placement, Placement::Inline);
    assert_eq!(raw.format, "html");
    assert!(raw.text.starts_with(r#"<img embedmath-tex="$x^2$" src="data:image/svg+xml;base64,"#));
}

#[test]
fn display_math_is_scaled_up() {
    let inline = encode_one("InlineMath", "a");
    let display = encode_one("DisplayMath", "a");
    let svg_of = |markup: &str| {
        use base64::Engine as _;
        let img = first_element(&markup[markup.find("<img").unwrap()..]).unwrap();
        let b64 = img
            .attr("src")
            .unwrap()
            .trim_start_matches("data:image/svg+xml;base64,");
        String::from_utf8(base64::engine::general_purpose::STANDARD.decode(b64).unwrap()).unwrap()
    };
    assert_eq!(svg_of(&inline), r#"<svg data-scale="1.0"/>"#);
    assert_eq!(svg_of(&display), r#"<svg data-scale="1.2"/>"#);
}

#[test]
fn variant_fidelity() {
    assert!(encode_one("InlineMath", "x").starts_with("<img "));
    assert!(!encode_one("InlineMath", "x").contains("<p "));
    assert!(encode_one("DisplayMath", "x").starts_with("<p align=\"center\""));
}

#[test]
fn math_inside_metadata_is_encoded_too() {
    let input = json!({
        "pandoc-api-version": [1, 23],
        "meta": {"title": {"t": "MetaInlines", "c": [math("InlineMath", "\\pi")]}},
        "blocks": []
    });
    let out = walk(input, &mut encoder()).unwrap();
    let title = &out["meta"]["title"]["c"][0];
    assert_eq!(ast::tag(title), Some("RawInline"));
}

#[test]
fn documents_without_math_are_untouched() {
    let input = doc(json!([
        {"t": "Header", "c": [1, ["intro", [], []], [str_node("Intro")]]},
        {"t": "CodeBlock", "c": [["", ["tex"], []], "$x$"]},
        {"t": "Para", "c": [{"t": "RawInline", "c": ["html", "<img src=\"a.png\">"]}]}
    ]));
    let out = walk(input.clone(), &mut encoder()).unwrap();
    assert_eq!(out, input);
    assert_eq!(
        serde_json::to_string(&out).unwrap(),
        serde_json::to_string(&input).unwrap()
    );
}

// ── Attribute round trip ────────────────────────────────────────────────────

#[test]
fn attribute_round_trips_for_awkward_sources() {
    for (kind, content) in [
        ("InlineMath", "x^2"),
        ("InlineMath", r#"\frac{a}{b} = "c""#),
        ("InlineMath", r"\text{\$5} \backslash"),
        ("DisplayMath", "a & b \\\\ c < d > e"),
        ("DisplayMath", "\\begin{aligned}\n x &= 1\n\\end{aligned}"),
        ("InlineMath", "α + β = γ, 𝔸"),
        ("InlineMath", "&amp; &quot; &#39;"),
    ] {
        let delimited = if kind == "InlineMath" {
            format!("${content}$")
        } else {
            format!("$${content}$$")
        };
        assert_eq!(recovered(&encode_one(kind, content)), delimited, "{content:?}");
    }
}

// ── Decoding ────────────────────────────────────────────────────────────────

/// The AST pandoc produces when it re-reads encoded markdown containing one
/// display formula between two paragraphs.
fn reread_display(markup: &str) -> Value {
    let split = markup.find("<img").unwrap();
    let open = &markup[..split];
    let img = &markup[split..markup.len() - "</p>".len()];
    doc(json!([
        {"t": "Para", "c": [str_node("before")]},
        ast::raw_block("html", open),
        {"t": "Plain", "c": [ast::raw_inline("html", img)]},
        ast::raw_block("html", "</p>"),
        {"t": "Para", "c": [str_node("after")]}
    ]))
}

#[test]
fn inline_embed_decodes_to_source() {
    let markup = encode_one("InlineMath", "x^2");
    let input = doc(json!([{"t": "Para", "c": [
        str_node("Area"), {"t": "Space"}, ast::raw_inline("html", &markup), str_node(".")
    ]}]));
    let mut f = DecodingFilter::new();
    let out = walk(input, &mut f).unwrap();
    assert_eq!(
        out["blocks"][0]["c"],
        json!([str_node("Area"), {"t": "Space"}, ast::raw_inline("markdown", "$x^2$"), str_node(".")])
    );
    assert_eq!(f.state(), DecodeState::Normal);
}

#[test]
fn display_embed_decodes_and_drops_auxiliary_block() {
    let markup = encode_one("DisplayMath", "\\int_0^1 f(x)dx");
    let mut f = DecodingFilter::new();
    let out = walk(reread_display(&markup), &mut f).unwrap();
    assert_eq!(
        out["blocks"],
        json!([
            {"t": "Para", "c": [str_node("before")]},
            ast::raw_block("markdown", "$$\\int_0^1 f(x)dx$$"),
            {"t": "Para", "c": [str_node("after")]}
        ])
    );
    assert_eq!(f.state(), DecodeState::Normal);
    assert_eq!(f.restored(), 1);
}

#[test]
fn single_block_embed_without_split_still_suppresses_next_raw_block() {
    // When the whole <p>…</p> arrives as one RawBlock, the suppression still
    // waits for the next RawBlock and eats everything up to it.
    let markup = encode_one("DisplayMath", "y");
    let input = doc(json!([
        ast::raw_block("html", &markup),
        {"t": "Para", "c": [str_node("swallowed")]},
        ast::raw_block("html", "<hr>"),
        {"t": "Para", "c": [str_node("kept")]}
    ]));
    let out = walk(input, &mut DecodingFilter::new()).unwrap();
    assert_eq!(
        out["blocks"],
        json!([
            ast::raw_block("markdown", "$$y$$"),
            {"t": "Para", "c": [str_node("kept")]}
        ])
    );
}

#[test]
fn inline_embed_never_suppresses() {
    let markup = encode_one("InlineMath", "z");
    let input = doc(json!([
        {"t": "Para", "c": [ast::raw_inline("html", &markup)]},
        {"t": "Para", "c": [str_node("next")]},
        ast::raw_block("html", "<hr>")
    ]));
    let out = walk(input, &mut DecodingFilter::new()).unwrap();
    let blocks = out["blocks"].as_array().unwrap();
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[1], json!({"t": "Para", "c": [str_node("next")]}));
    assert_eq!(blocks[2], ast::raw_block("html", "<hr>"));
}

#[test]
fn missing_auxiliary_block_over_deletes() {
    // A block embed with no trailing image block swallows everything up to
    // the next unrelated raw block.
    let input = doc(json!([
        ast::raw_block("html", r#"<p embedmath-tex="$$q$$">"#),
        {"t": "Para", "c": [str_node("lost")]},
        ast::raw_block("html", "<div>")
    ]));
    let out = walk(input, &mut DecodingFilter::new()).unwrap();
    assert_eq!(out["blocks"], json!([ast::raw_block("markdown", "$$q$$")]));
}

#[test]
fn two_auxiliary_blocks_under_delete() {
    // Only the first trailing RawBlock is consumed; a second one survives.
    let input = doc(json!([
        ast::raw_block("html", r#"<p embedmath-tex="$$q$$">"#),
        ast::raw_block("html", "</p>"),
        ast::raw_block("html", "</p>")
    ]));
    let out = walk(input, &mut DecodingFilter::new()).unwrap();
    assert_eq!(
        out["blocks"],
        json!([
            ast::raw_block("markdown", "$$q$$"),
            ast::raw_block("html", "</p>")
        ])
    );
}

#[test]
fn decode_of_encode_is_identity() {
    for (kind, content) in [
        ("InlineMath", "e^{i\\pi} + 1 = 0"),
        ("InlineMath", r#"\mathrm{"quoted"}"#),
        ("DisplayMath", "\\sum_{n=1}^\\infty \\frac{1}{n^2} = \\frac{\\pi^2}{6}"),
    ] {
        let markup = encode_one(kind, content);
        let expected = if kind == "InlineMath" {
            format!("${content}$")
        } else {
            format!("$${content}$$")
        };
        let input = if kind == "InlineMath" {
            doc(json!([{"t": "Para", "c": [ast::raw_inline("html", &markup)]}]))
        } else {
            reread_display(&markup)
        };
        let out = walk(input, &mut DecodingFilter::new()).unwrap();
        let restored: Vec<String> = out["blocks"]
            .as_array()
            .unwrap()
            .iter()
            .flat_map(|b| {
                let inner = b["c"].as_array().cloned().unwrap_or_default();
                std::iter::once(b.clone()).chain(inner)
            })
            .filter_map(|n| {
                ast::as_raw(&n)
                    .filter(|r| r.format == "markdown")
                    .map(|r| r.text.to_string())
            })
            .collect();
        assert_eq!(restored, vec![expected]);
    }
}
