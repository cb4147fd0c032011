//! HTML rendering of card data: the DOM a render surface exposes.
//!
//! Every card is a `.card-container > .card-inner` with two faces,
//! `.card-front-default` (content) and `.card-back-rotated` (deck design).
//! The full deck is also mounted, all at once, in an off-screen capture
//! container so element counts stay stable during an export.

use crate::deck::{Card, Category, Deck};
use crate::flip::FlipBoard;
use crate::hand::{ComposedSentence, Hand};

pub const CAPTURE_CONTAINER_ID: &str = "full-deck-capture-container";
pub const DOWNLOAD_BUTTON_ID: &str = "download-full-deck";
/// Readiness marker for full-deck and category exports
pub const CAPTURE_MARKER: &str = "#full-deck-capture-container";
/// Readiness marker for mixed-hand exports
pub const MIX_MARKER: &str = ".mix-grid";

const BACK_CIRCLES: usize = 12;
const BACK_TITLE: [&str; 4] = ["THING", "FROM", "THE FUTURE", "OF WORK"];
const LAB_NAME: &str = "AI Futures Lab";

pub fn back_selector(category: Category) -> String {
    format!(".capture-back-{} .card-back-rotated", category)
}

pub fn front_selector(category: Category) -> String {
    format!(".capture-front-{} .card-front-default", category)
}

pub fn mix_front_selector(category: Category) -> String {
    format!(".mix-grid .mix-card-{} .card-front-default", category)
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn face_style(category: Category, rotated: bool) -> String {
    let mut style = format!(
        "background-color: {}; position: absolute; width: 100%; height: 100%",
        category.color()
    );
    if rotated {
        style.push_str("; transform: rotateY(180deg)");
    }
    style
}

/// One card with both faces. `flipped` turns the inner element so the back
/// shows; the faces themselves are identical either way.
pub fn render_card(card: &Card, flipped: bool) -> String {
    let category = card.category;
    let quote = match card.subtext() {
        Some(sub) => format!(
            r#"<span class="card-subtext" style="display: block">{}</span>{}"#,
            escape(sub),
            escape(card.front_text())
        ),
        None => escape(card.front_text()),
    };
    let circles = r#"<div class="circle"></div>"#.repeat(BACK_CIRCLES);
    let inner_style = if flipped {
        r#" style="transform: rotateY(180deg)""#
    } else {
        ""
    };
    format!(
        concat!(
            r#"<div class="card-container{flipped}">"#,
            r#"<div class="card-inner"{inner_style}>"#,
            r#"<div class="card-face card-front-default" style="{front_style}">"#,
            r#"<div class="quote-icon">❝</div>"#,
            r#"<div class="card-content-quote">{quote}</div>"#,
            r#"<div class="card-footer"><div class="card-type">{category} card</div><div class="card-category-small">{lab}</div></div>"#,
            r#"</div>"#,
            r#"<div class="card-face card-back-rotated" style="{back_style}">"#,
            r#"<div class="circles-grid">{circles}</div>"#,
            r#"<div class="card-title-back">{title}</div>"#,
            r#"</div>"#,
            r#"</div></div>"#
        ),
        flipped = if flipped { " flipped" } else { "" },
        inner_style = inner_style,
        front_style = face_style(category, false),
        quote = quote,
        category = category,
        lab = LAB_NAME,
        back_style = face_style(category, true),
        circles = circles,
        title = BACK_TITLE.join("<br>"),
    )
}

/// Off-screen container holding every card of every category
pub fn render_capture_container(deck: &Deck, board: &FlipBoard) -> String {
    let mut html = format!(
        r#"<div id="{}" style="position: fixed; left: -9999px; top: 0">"#,
        CAPTURE_CONTAINER_ID
    );
    for category in Category::ALL {
        let cards = deck.cards(category);
        // Backs are shared per category, so any card renders the back
        if let Some(first) = cards.first() {
            html.push_str(&format!(
                r#"<div class="capture-back-{}">{}</div>"#,
                category,
                render_card(first, true)
            ));
        }
        for (i, card) in cards.iter().enumerate() {
            html.push_str(&format!(
                r#"<div class="capture-front-{}">{}</div>"#,
                category,
                render_card(card, board.is_flipped(category, i))
            ));
        }
    }
    html.push_str("</div>");
    html
}

pub fn render_mix_grid(hand: &Hand, board: &FlipBoard) -> String {
    let mut html = String::from(r#"<div class="mix-grid">"#);
    for category in Category::ALL {
        if let Some(card) = hand.get(category) {
            html.push_str(&format!(
                r#"<div class="mix-card-wrapper mix-card-{}"><div class="card-grid">{}</div></div>"#,
                category,
                render_card(card, board.is_hand_flipped(category))
            ));
        }
    }
    html.push_str("</div>");
    html
}

pub fn render_sentence(sentence: &ComposedSentence) -> String {
    let [arc, object, terrain, mood] = sentence.highlights().map(|(category, text)| {
        format!(
            r#"<span class="sentence-highlight" style="color: {}">{}</span>"#,
            category.color(),
            escape(text)
        )
    });
    format!(
        r#"<div class="synthesized-sentence-container"><p class="synthesized-sentence">In a {} future there is an {} related to {} that inspires {}.<br><span class="sentence-prompt">{}</span></p></div>"#,
        arc,
        object,
        terrain,
        mood,
        ComposedSentence::PROMPT
    )
}

/// Complete document: hand, sentence, and the hidden full-deck container
pub fn render_page(deck: &Deck, hand: &Hand, board: &FlipBoard) -> String {
    format!(
        concat!(
            "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Thing from the future of work</title></head>\n",
            "<body><div class=\"app-container\">",
            "<header><h1>Thing from the future of work</h1>",
            "<button id=\"{}\" class=\"download-btn\">Download full deck</button></header>",
            "<main>{}{}</main>",
            "</div>{}</body>\n</html>\n"
        ),
        DOWNLOAD_BUTTON_ID,
        render_mix_grid(hand, board),
        render_sentence(&hand.sentence()),
        render_capture_container(deck, board),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::DeckRng;
    use scraper::{Html, Selector};

    fn count(html: &str, sel: &str) -> usize {
        let doc = Html::parse_document(html);
        doc.select(&Selector::parse(sel).unwrap()).count()
    }

    #[test]
    fn capture_container_has_one_back_and_all_fronts() {
        let deck = Deck::builtin();
        let board = FlipBoard::new(&deck);
        let hand = Hand::deal(&deck, &mut DeckRng::new(5));
        let page = render_page(&deck, &hand, &board);
        for category in Category::ALL {
            assert_eq!(count(&page, &back_selector(category)), 1);
            assert_eq!(count(&page, &front_selector(category)), deck.count(category));
            assert_eq!(count(&page, &mix_front_selector(category)), 1);
        }
        assert_eq!(count(&page, CAPTURE_MARKER), 1);
        assert_eq!(count(&page, MIX_MARKER), 1);
    }

    #[test]
    fn flipped_card_rotates_inner() {
        let card = Card::text(Category::Mood, "hope");
        assert!(render_card(&card, true).contains(r#"class="card-container flipped""#));
        assert!(!render_card(&card, false).contains("flipped"));
    }

    #[test]
    fn card_text_is_escaped() {
        let card = Card::text(Category::Object, "<script>");
        let html = render_card(&card, false);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn sentence_markup_reads_in_order() {
        let mut hand = Hand::default();
        hand.set(Card::arc("Collapse", "Later"));
        let html = render_sentence(&hand.sentence());
        let doc = Html::parse_fragment(&html);
        let text: String = doc.root_element().text().collect();
        assert!(text.starts_with("In a Collapse future there is an ..."));
        assert!(text.ends_with("What is it?"));
    }

    #[test]
    fn sentence_highlights_carry_category_colours() {
        let sentence = ComposedSentence {
            arc: "Growth".into(),
            terrain: "the commute".into(),
            object: "badge".into(),
            mood: "pride".into(),
        };
        let doc = Html::parse_fragment(&render_sentence(&sentence));
        let sel = Selector::parse(".sentence-highlight").unwrap();
        let spans: Vec<(String, String)> = doc
            .select(&sel)
            .map(|e| (e.value().attr("style").unwrap_or("").to_string(), e.text().collect()))
            .collect();
        assert_eq!(
            spans,
            vec![
                ("color: #E53935".to_string(), "Growth".to_string()),
                ("color: #1E88E5".to_string(), "badge".to_string()),
                ("color: #43A047".to_string(), "the commute".to_string()),
                ("color: #FB8C00".to_string(), "pride".to_string()),
            ]
        );
    }

    #[test]
    fn front_face_carries_the_quote_mark() {
        let html = render_card(&Card::text(Category::Mood, "hope"), false);
        let doc = Html::parse_fragment(&html);
        let sel = Selector::parse(".quote-icon").unwrap();
        let icon: String = doc.select(&sel).flat_map(|e| e.text()).collect();
        assert_eq!(icon, "\u{275D}");
    }
}
