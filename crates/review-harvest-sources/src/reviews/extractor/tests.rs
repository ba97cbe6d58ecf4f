use super::*;
use crate::reviews::extract_reviews;
use chrono::NaiveDate;
use review_harvest_config::FieldRule;
use review_harvest_models::ReviewField;

fn review_item(author: &str, timestamp: &str, rating: &str, text: &str) -> String {
    format!(
        r#"<li data-type="review" data-timestamp="{timestamp}" user-rating="{rating}">
             <div class="cmt-head"><span class="user-name">{author}</span></div>
             <p class="comment-text">{text}</p>
           </li>"#
    )
}

fn page(items: &[String]) -> String {
    format!(
        r#"<html><body><div class="comments-list"><ul>{}</ul></div></body></html>"#,
        items.join("\n")
    )
}

fn extractor(max_reviews: usize) -> Extractor {
    Extractor::new(&SelectorRules::default(), max_reviews)
}

#[test]
fn test_primary_convention() {
    let html = page(&[
        review_item("Ivan", "1700000000", "0.8", "Good   campus"),
        review_item("Olga", "1600000000", "0.2", "Too *** cold"),
    ]);
    let harvest = extract_reviews(&html, &extractor(10));

    assert_eq!(harvest.fragments_found, 2);
    assert_eq!(harvest.convention.as_deref(), Some(r#"li[data-type="review"]"#));

    let reviews = harvest.batch.as_slice();
    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0].author, "Ivan");
    assert_eq!(reviews[0].published_at, NaiveDate::from_ymd_opt(2023, 11, 14));
    assert_eq!(reviews[0].rating, 4);
    assert_eq!(reviews[0].text, "Good campus");
    assert_eq!(reviews[1].author, "Olga");
    assert_eq!(reviews[1].rating, 1);
    assert_eq!(reviews[1].text, "Too cold");
}

#[test]
fn test_secondary_convention_used_only_when_primary_is_empty() {
    let html = r#"
        <div class="comments-list">
          <li class="comment" data-timestamp="1700000000">
            <div class="cmt-user-name"><span>Pavel</span></div>
            <div class="comment-text">Secondary layout</div>
            <span user-rating="1"></span>
          </li>
        </div>"#;
    let harvest = extract_reviews(html, &extractor(10));

    assert_eq!(harvest.convention.as_deref(), Some("div.comments-list li.comment"));
    let review = &harvest.batch.as_slice()[0];
    assert_eq!(review.author, "Pavel");
    assert_eq!(review.text, "Secondary layout");
    assert_eq!(review.rating, 5);
}

#[test]
fn test_fallback_is_page_wide_not_per_fragment() {
    // One primary fragment exists, so the secondary container is ignored entirely
    let html = format!(
        r#"<div class="comments-list">
             {}
             <li class="comment"><span class="user-name">Ignored</span></li>
           </div>"#,
        review_item("Ivan", "1", "1", "Only me")
    );
    let harvest = extract_reviews(&html, &extractor(10));

    assert_eq!(harvest.batch.len(), 1);
    assert_eq!(harvest.batch.as_slice()[0].author, "Ivan");
}

#[test]
fn test_no_containers_gives_empty_result() {
    let html = "<html><body><div class='something-else'>Nothing here</div></body></html>";
    let harvest = extract_reviews(html, &extractor(10));

    assert!(harvest.is_empty());
    assert_eq!(harvest.fragments_found, 0);
    assert_eq!(harvest.convention, None);
}

#[test]
fn test_bounded_batch_keeps_document_order() {
    let items: Vec<String> = (0..25)
        .map(|i| review_item(&format!("user{}", i), &format!("{}", 1_700_000_000 + i), "1", &format!("text {}", i)))
        .collect();
    let harvest = extract_reviews(&page(&items), &extractor(10));

    assert_eq!(harvest.fragments_found, 25);
    assert_eq!(harvest.batch.len(), 10);
    let authors: Vec<&str> = harvest.batch.iter().map(|r| r.author.as_str()).collect();
    let expected: Vec<String> = (0..10).map(|i| format!("user{}", i)).collect();
    assert_eq!(authors, expected);
}

#[test]
fn test_fragment_positions() {
    let html = page(&[review_item("a", "1", "1", "x"), review_item("b", "2", "1", "y")]);
    let document = Html::parse_document(&html);
    let selection = extractor(10).select_fragments(&document);
    let positions: Vec<usize> = selection.fragments.iter().map(|f| f.position()).collect();
    assert_eq!(positions, vec![0, 1]);
}

#[test]
fn test_missing_fields_default_independently() {
    let html = r#"
        <li data-type="review">
          <p class="comment-text">Only text here</p>
        </li>
        <li data-type="review" user-rating="0.6">
          <span class="user-name">  </span>
        </li>"#;
    let harvest = extract_reviews(html, &extractor(10));
    let reviews = harvest.batch.as_slice();

    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0].author, "anonymous");
    assert_eq!(reviews[0].published_at, None);
    assert_eq!(reviews[0].rating, 1);
    assert_eq!(reviews[0].text, "Only text here");

    assert_eq!(reviews[1].author, "anonymous");
    assert_eq!(reviews[1].rating, 3);
    assert_eq!(reviews[1].text, "");

    assert_eq!(harvest.defaulted.get(&ReviewField::Author), Some(&2));
    assert_eq!(harvest.defaulted.get(&ReviewField::Text), Some(&1));
    assert_eq!(harvest.defaulted.get(&ReviewField::Rating), Some(&1));
}

#[test]
fn test_read_fields_raw_values() {
    let html = page(&[review_item(" Ivan ", "1700000000", "0.9", "  spaced   out ")]);
    let document = Html::parse_document(&html);
    let ex = extractor(10);
    let selection = ex.select_fragments(&document);
    let raw = ex.read_fields(&selection.fragments[0]);

    assert_eq!(raw.author.as_deref(), Some("Ivan"));
    assert_eq!(raw.timestamp.as_deref(), Some("1700000000"));
    assert_eq!(raw.rating.as_deref(), Some("0.9"));
    assert_eq!(raw.text.as_deref(), Some("spaced   out"));
}

#[test]
fn test_blank_timestamp_attribute_is_kept() {
    let html = r#"<li data-type="review" data-timestamp="">
          <time data-timestamp="1600000000"></time>
          <span class="user-name">Ivan</span><p class="comment-text">Hi</p>
        </li>"#;
    let document = Html::parse_document(html);
    let ex = extractor(10);
    let selection = ex.select_fragments(&document);
    let raw = ex.read_fields(&selection.fragments[0]);
    assert_eq!(raw.timestamp.as_deref(), Some(""));

    let extracted = extract_reviews(html, &ex);
    let review = &extracted.batch.as_slice()[0];
    assert_eq!(review.published_at, None);
    assert_eq!(
        review.identity_hash,
        "9fa6d7109af60aa4e034df8fde8676ae3f91f9905188db172ca7a0263528da3b"
    );
}

#[test]
fn test_timestamp_from_descendant_rule() {
    let html = r#"
        <li data-type="review">
          <time data-timestamp="1600000000"></time>
          <span class="user-name">Ivan</span>
        </li>"#;
    let harvest = extract_reviews(html, &extractor(10));
    assert_eq!(
        harvest.batch.as_slice()[0].published_at,
        NaiveDate::from_ymd_opt(2020, 9, 13)
    );
}

#[test]
fn test_invalid_selector_rules_are_skipped() {
    let mut rules = SelectorRules::default();
    rules.containers.insert(0, "li[[broken".to_string());
    rules.author.insert(0, FieldRule::text("span..bad"));

    let html = page(&[review_item("Ivan", "1", "1", "text")]);
    let harvest = extract_reviews(&html, &Extractor::new(&rules, 10));

    assert_eq!(harvest.batch.len(), 1);
    assert_eq!(harvest.batch.as_slice()[0].author, "Ivan");
}

#[test]
fn test_wait_selector_skips_unusable_containers() {
    let mut rules = SelectorRules::default();
    rules.containers.insert(0, "li[[broken".to_string());
    rules.containers.insert(1, "   ".to_string());

    let wait = Extractor::new(&rules, 10).wait_selector().unwrap();
    assert_eq!(wait, r#"li[data-type="review"], div.comments-list li.comment"#);
    assert!(scraper::Selector::parse(&wait).is_ok());

    let rules = SelectorRules {
        containers: vec!["li[[broken".to_string(), String::new()],
        ..SelectorRules::default()
    };
    assert_eq!(Extractor::new(&rules, 10).wait_selector(), None);
}

#[test]
fn test_custom_layout_is_additive() {
    let mut rules = SelectorRules::default();
    rules.containers.push("article.review-card".to_string());
    rules.author.push(FieldRule::attr("header", "data-author"));
    rules.text.push(FieldRule::text("section.body"));

    let html = r#"
        <article class="review-card" data-rating="1">
          <header data-author="Maria"></header>
          <section class="body">New layout</section>
        </article>"#;
    let harvest = extract_reviews(html, &Extractor::new(&rules, 10));

    let review = &harvest.batch.as_slice()[0];
    assert_eq!(review.author, "Maria");
    assert_eq!(review.text, "New layout");
    assert_eq!(review.rating, 5);
}
