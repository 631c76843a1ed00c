// Field extraction as ordered rule cascades.
//
// Each field owns a list of rules, tried in order; the first rule that
// returns a value decides the field. Rules are plain functions over an
// `ExtractionContext`, so each one can be tested on its own.

use super::patterns::{
    find_all, DATE_PATTERNS, EMAIL_PATTERN, FEE_PATTERN, FIELD_LABEL_LINE, FREE_PATTERN, PHONE_PATTERNS,
    TIME_PATTERN, VENUE_KEYWORD_LINE,
};
use crate::models::{push_unique, EntityEvidence, EventRecord, ExtractionTables, ImageInsight};
use log::debug;

/// Everything a rule may look at.
pub struct ExtractionContext<'a> {
    pub text: &'a str,
    pub lower: String,
    pub lines: Vec<&'a str>,
    pub evidence: EntityEvidence,
    pub insight: Option<&'a ImageInsight>,
    pub tables: &'a ExtractionTables,
    /// Set once the title cascade has run.
    pub title: String,
}

impl<'a> ExtractionContext<'a> {
    pub fn new(
        text: &'a str,
        evidence: &EntityEvidence,
        insight: Option<&'a ImageInsight>,
        tables: &'a ExtractionTables,
    ) -> Self {
        let lines = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        let mut evidence = evidence.clone();

        // Pattern evidence goes after recognizer evidence
        for pattern in DATE_PATTERNS.iter() {
            for date in find_all(pattern, text) {
                push_unique(&mut evidence.dates, &date);
            }
        }
        for time in find_all(&TIME_PATTERN, text) {
            push_unique(&mut evidence.times, &time);
        }

        ExtractionContext {
            text,
            lower: text.to_lowercase(),
            lines,
            evidence,
            insight,
            tables,
            title: String::new(),
        }
    }
}

pub type Rule<T> = fn(&ExtractionContext) -> Option<T>;

#[derive(Debug, Clone, PartialEq)]
pub struct Venue {
    pub name: String,
    pub address: String,
}

pub const TITLE_RULES: &[(&str, Rule<String>)] = &[
    ("first_line", title_from_first_line),
    ("caption", title_from_caption),
];

pub const VENUE_RULES: &[(&str, Rule<Venue>)] = &[
    ("keyword_line", venue_from_keyword_line),
    ("gazetteer", venue_from_gazetteer),
    ("location_entity", venue_from_entities),
];

pub const PHONE_RULES: &[(&str, Rule<String>)] = &[
    ("international", phone_international),
    ("local_mobile", phone_local_mobile),
];

pub const FEE_RULES: &[(&str, Rule<String>)] = &[
    ("money_entity", fee_from_entities),
    ("fee_keyword", fee_from_keyword),
    ("free", fee_from_free_word),
];

/// Evaluate `rules` in order and return the first value produced.
pub fn first_match<T>(rules: &[(&str, Rule<T>)], ctx: &ExtractionContext) -> Option<T> {
    for (name, rule) in rules {
        if let Some(value) = rule(ctx) {
            debug!("Rule {} matched", name);
            return Some(value);
        }
    }
    None
}

pub fn title_from_first_line(ctx: &ExtractionContext) -> Option<String> {
    ctx.lines
        .iter()
        .find(|line| line.chars().count() > 2 || line.chars().any(|c| c.is_ascii_digit()))
        .map(|line| line.to_string())
}

pub fn title_from_caption(ctx: &ExtractionContext) -> Option<String> {
    let caption = ctx.insight?.caption.trim();
    if caption.is_empty() {
        return None;
    }
    Some(caption.chars().take(ctx.tables.caption_title_limit).collect())
}

/// The line after `index` as a venue address.
///
/// Not a plain next-line rule: a line that opens another labelled field
/// (`Contact:`, `Date:`, `Fee:`, another venue label) is never taken as the
/// address, so `Venue: X` followed by `Contact: ...` leaves the address empty.
fn address_after(ctx: &ExtractionContext, index: usize) -> String {
    match ctx.lines.get(index + 1) {
        Some(next) if !FIELD_LABEL_LINE.is_match(next) && !VENUE_KEYWORD_LINE.is_match(next) => {
            next.to_string()
        }
        _ => String::new(),
    }
}

pub fn venue_from_keyword_line(ctx: &ExtractionContext) -> Option<Venue> {
    for (index, line) in ctx.lines.iter().enumerate() {
        let Some(caps) = VENUE_KEYWORD_LINE.captures(line) else {
            continue;
        };
        let name = caps[1].trim();
        if name.chars().count() > 3 {
            return Some(Venue {
                name: name.to_string(),
                address: address_after(ctx, index),
            });
        }
    }
    None
}

// Entries match at the start of a word rather than anywhere in the line,
// so "hall" hits "Halls" but skips "challenge".
fn mentions_gazetteer_entry(line_lower: &str, entry: &str) -> bool {
    let entry = entry.to_lowercase();
    line_lower.match_indices(&entry).any(|(pos, _)| {
        line_lower[..pos]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric())
    })
}

pub fn venue_from_gazetteer(ctx: &ExtractionContext) -> Option<Venue> {
    for (index, line) in ctx.lines.iter().enumerate() {
        if *line == ctx.title {
            continue;
        }
        if line.chars().count() <= 5 || line.chars().any(|c| c.is_ascii_digit()) {
            continue;
        }
        let lower = line.to_lowercase();
        if ctx
            .tables
            .venue_gazetteer
            .iter()
            .any(|entry| mentions_gazetteer_entry(&lower, entry))
        {
            return Some(Venue {
                name: line.to_string(),
                address: address_after(ctx, index),
            });
        }
    }
    None
}

pub fn venue_from_entities(ctx: &ExtractionContext) -> Option<Venue> {
    let locations = &ctx.evidence.locations;
    locations
        .iter()
        .find(|loc| !ctx.tables.is_excluded_location(loc))
        .or_else(|| locations.first())
        .map(|name| Venue {
            name: name.clone(),
            address: String::new(),
        })
}

pub fn email_from_text(ctx: &ExtractionContext) -> Option<String> {
    EMAIL_PATTERN.find(ctx.text).map(|m| m.as_str().to_string())
}

pub fn phone_international(ctx: &ExtractionContext) -> Option<String> {
    PHONE_PATTERNS[0].find(ctx.text).map(|m| m.as_str().trim().to_string())
}

pub fn phone_local_mobile(ctx: &ExtractionContext) -> Option<String> {
    PHONE_PATTERNS[1].find(ctx.text).map(|m| m.as_str().to_string())
}

pub fn fee_from_entities(ctx: &ExtractionContext) -> Option<String> {
    ctx.evidence.money.first().cloned()
}

pub fn fee_from_keyword(ctx: &ExtractionContext) -> Option<String> {
    FEE_PATTERN.captures(ctx.text).map(|caps| caps[1].to_string())
}

pub fn fee_from_free_word(ctx: &ExtractionContext) -> Option<String> {
    FREE_PATTERN.is_match(ctx.text).then(|| "0".to_string())
}

pub fn category_from_keywords(ctx: &ExtractionContext) -> Option<String> {
    ctx.tables
        .categories
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| ctx.lower.contains(&k.to_lowercase())))
        .map(|rule| rule.name.clone())
}

/// `Date: d1, d2 | Time: t1, t2`, keeping at most two of each.
pub fn describe_schedule(dates: &[String], times: &[String]) -> String {
    let mut parts = Vec::new();
    if !dates.is_empty() {
        parts.push(format!("Date: {}", dates.iter().take(2).cloned().collect::<Vec<_>>().join(", ")));
    }
    if !times.is_empty() {
        parts.push(format!("Time: {}", times.iter().take(2).cloned().collect::<Vec<_>>().join(", ")));
    }
    parts.join(" | ")
}

/// Heuristic field extraction engine.
pub struct FieldExtractor<'a> {
    tables: &'a ExtractionTables,
}

impl<'a> FieldExtractor<'a> {
    pub fn new(tables: &'a ExtractionTables) -> Self {
        FieldExtractor { tables }
    }

    /// Build a record from cleaned OCR text. Confidence is left at its
    /// default; fusion sets it afterwards.
    pub fn extract(
        &self,
        text: &str,
        evidence: &EntityEvidence,
        insight: Option<&ImageInsight>,
    ) -> EventRecord {
        let mut ctx = ExtractionContext::new(text, evidence, insight, self.tables);
        let mut record = EventRecord::default();

        record.title = first_match(TITLE_RULES, &ctx).unwrap_or_default();
        ctx.title = record.title.clone();

        record.description = describe_schedule(&ctx.evidence.dates, &ctx.evidence.times);

        if let Some(venue) = first_match(VENUE_RULES, &ctx) {
            record.venue_name = venue.name;
            record.venue_address = venue.address;
        }

        record.contact_email = email_from_text(&ctx).unwrap_or_default();
        record.contact_phone = first_match(PHONE_RULES, &ctx).unwrap_or_default();
        record.entry_fee = first_match(FEE_RULES, &ctx).unwrap_or_default();

        if let Some(category) = category_from_keywords(&ctx) {
            record.add_tag(&category);
            record.category = category;
        }
        for tag in &self.tables.tag_keywords {
            if ctx.lower.contains(&tag.to_lowercase()) {
                record.add_tag(tag);
            }
        }

        if let Some(insight) = insight {
            self.backfill(&mut record, insight);
        }

        record
    }

    /// Fill still-empty fields from image question answers.
    fn backfill(&self, record: &mut EventRecord, insight: &ImageInsight) {
        let answered = |answer: &Option<String>| {
            answer
                .as_deref()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
        };

        if record.title.is_empty() {
            if let Some(title) = answered(&insight.title_answer) {
                record.title = title;
            }
        }
        if record.venue_name.is_empty() {
            if let Some(venue) = answered(&insight.venue_answer) {
                record.venue_name = venue;
            }
        }
        if record.category.is_empty() {
            if let Some(answer) = answered(&insight.category_answer) {
                let answer = answer.to_lowercase();
                let category = self
                    .tables
                    .category_names()
                    .find(|name| answer.contains(&name.to_lowercase()))
                    .map(str::to_string);
                if let Some(category) = category {
                    record.add_tag(&category);
                    record.category = category;
                }
            }
        }
    }
}
