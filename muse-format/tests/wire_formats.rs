//! End-to-end rendering of both wire formats from block views.

use muse_core::{Color, FormatMode, SegmentColors, Theme};
use muse_format::{i3, lemonbar, render_line, BlockContent, BlockView, ZoneViews};
use rstest::rstest;

fn view(name: &str, icon: Option<char>, primary: &str, secondary: &str) -> BlockView {
    BlockView::new(
        name,
        BlockContent {
            icon,
            primary: primary.to_string(),
            secondary: secondary.to_string(),
            ..BlockContent::default()
        },
    )
}

fn zones() -> ZoneViews {
    let mut hidden = view("playerctl", Some('P'), "song", "artist");
    hidden.content.hidden = true;
    ZoneViews {
        left: vec![view("window", None, "", "Terminal")],
        center: vec![hidden, view("date", Some('C'), "3:04 pm", "Mon, Jan 2")],
        right: vec![
            view("volume", Some('V'), "40%", ""),
            view("battery", Some('B'), "80%", "Until 9:30 pm"),
        ],
    }
}

#[test]
fn lemonbar_line_has_one_directive_per_zone() {
    let theme = Theme::default();
    let line = render_line(&zones(), &theme).expect("render");

    assert!(line.starts_with("%{l}"));
    assert_eq!(line.matches("%{l}").count(), 1);
    assert_eq!(line.matches("%{c}").count(), 1);
    assert_eq!(line.matches("%{r}").count(), 1);
    assert!(!line.contains("song"));

    let center = line
        .split("%{c}")
        .nth(1)
        .and_then(|rest| rest.split("%{r}").next())
        .expect("center zone");
    assert!(!center.starts_with(lemonbar::BLOCK_SEPARATOR));
    assert!(center.contains("3:04 pm"));

    let right = line.split("%{r}").nth(1).expect("right zone");
    assert_eq!(right.matches(lemonbar::BLOCK_SEPARATOR).count(), 1);
}

#[test]
fn i3_line_is_a_json_array_of_visible_blocks() {
    let theme = Theme {
        mode: FormatMode::I3,
        ..Theme::default()
    };
    let line = render_line(&zones(), &theme).expect("render");
    assert!(!line.starts_with(','));

    let parsed: serde_json::Value = serde_json::from_str(&line).expect("valid JSON");
    let names: Vec<_> = parsed
        .as_array()
        .expect("array")
        .iter()
        .map(|b| b["name"].as_str().expect("name").to_string())
        .collect();
    assert_eq!(names, ["window", "date", "volume", "battery"]);
    for block in parsed.as_array().expect("array") {
        assert_eq!(block["markup"], "pango");
        assert_eq!(block["separator"], true);
    }
}

#[test]
fn force_short_makes_full_and_short_identical() {
    let theme = Theme {
        mode: FormatMode::I3,
        ..Theme::default()
    };
    let mut v = view("weather", Some('S'), "72°", "Clear sky");
    v.content.force_short = true;
    let block = i3::render_block(&v, &theme).expect("visible");
    assert_eq!(block.full_text, block.short_text);
    assert!(!block.full_text.contains("Clear sky"));
}

#[rstest]
#[case::ampersand("Tom & Jerry", "Tom &amp; Jerry")]
#[case::angle("<b>bold</b>", "&lt;b&gt;bold&lt;/b&gt;")]
fn markup_characters_are_escaped(#[case] title: &str, #[case] expected: &str) {
    let theme = Theme {
        mode: FormatMode::I3,
        ..Theme::default()
    };
    let line = i3::render_array([&view("window", None, title, "")], &theme).expect("render");
    assert!(line.contains(expected), "line: {line}");
}

#[test]
fn quotes_are_json_escaped() {
    let theme = Theme {
        mode: FormatMode::I3,
        ..Theme::default()
    };
    let line =
        i3::render_array([&view("window", None, r#"say "hi""#, "")], &theme).expect("render");
    assert!(line.contains(r#"say \"hi\""#), "line: {line}");
    assert!(line.contains(r##"<span color=\"#ffffffff\">"##));
    let parsed: serde_json::Value = serde_json::from_str(&line).expect("still valid JSON");
    assert!(parsed[0]["full_text"]
        .as_str()
        .expect("text")
        .contains(r#"say "hi""#));
}

#[test]
fn colorer_overrides_apply_in_both_modes() {
    let alarm = Color::rgb(0xff, 0, 0);
    let v = view("battery", Some('B'), "4%", "").with_colors(SegmentColors::uniform(alarm));

    let lemon = lemonbar::render_block(&v, &Theme::default());
    assert!(lemon.contains("%{F#ffff0000}4%"));

    let theme = Theme {
        mode: FormatMode::I3,
        ..Theme::default()
    };
    let json = i3::full_text(&v, &theme);
    assert!(json.contains(r##"color="#ff0000ff""##));
}
