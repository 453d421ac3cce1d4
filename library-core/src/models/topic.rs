//! Topic taxonomy and tree building for the visualizer

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use super::org::{validate_slug, MAX_SLUG_LEN};
use super::validation::{bounded, ValidationError};

const MAX_NAME_LEN: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTopic {
    pub name: String,
    pub slug: String,
    pub parent_id: Option<Uuid>,
}

impl NewTopic {
    pub fn new(name: &str, parent_id: Option<Uuid>) -> Result<Self, ValidationError> {
        let name = bounded("name", name, MAX_NAME_LEN)?;
        let mut slug = slugify(&name);
        if slug.is_empty() && name.chars().any(char::is_alphanumeric) {
            slug = hashed_slug(&name);
        }
        let slug = validate_slug(&slug)?;
        Ok(Self {
            name,
            slug,
            parent_id,
        })
    }
}

/// Latin letters that compatibility decomposition leaves alone.
fn fold_letter(ch: char) -> Option<&'static str> {
    Some(match ch {
        'ß' => "ss",
        'æ' => "ae",
        'œ' => "oe",
        'ø' => "o",
        'đ' | 'ð' => "d",
        'ł' => "l",
        'þ' => "th",
        'ı' => "i",
        _ => return None,
    })
}

/// "Machine Learning & AI" -> "machine-learning-ai", "Café Crème" -> "cafe-creme"
///
/// Accents are stripped and a few Latin letters folded to ASCII; anything
/// else that is not ASCII alphanumeric separates words. Long results are
/// cut at a word boundary to fit a slug.
pub fn slugify(name: &str) -> String {
    fn push_word_part(slug: &mut String, pending_dash: &mut bool, part: &str) {
        if *pending_dash && !slug.is_empty() {
            slug.push('-');
        }
        *pending_dash = false;
        slug.push_str(part);
    }

    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.nfkd().filter(|c| !is_combining_mark(*c)).flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            push_word_part(&mut slug, &mut pending_dash, ch.encode_utf8(&mut [0; 4]));
        } else if let Some(folded) = fold_letter(ch) {
            push_word_part(&mut slug, &mut pending_dash, folded);
        } else {
            pending_dash = true;
        }
    }

    if slug.len() > MAX_SLUG_LEN {
        let at_word_end = slug.as_bytes()[MAX_SLUG_LEN] == b'-';
        slug.truncate(MAX_SLUG_LEN);
        if !at_word_end {
            if let Some(cut) = slug.rfind('-') {
                slug.truncate(cut);
            }
        }
    }
    slug
}

/// Stable slug for names with no Latin letters ("日本" -> "t-3f2a...").
///
/// Derived from the name, so the same name still collides on the unique slug.
fn hashed_slug(name: &str) -> String {
    let id = Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).simple().to_string();
    format!("t-{}", &id[..12])
}

/// Topic with its nested children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicNode {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub children: Vec<TopicNode>,
}

/// Arrange a flat topic list into a forest.
///
/// Roots are topics without a parent or whose parent is not in `topics`.
/// Siblings are sorted by name. Topics caught in a parent cycle are
/// surfaced as extra roots (the cycle is cut where it is entered) instead
/// of being dropped.
pub fn build_tree(topics: &[Topic]) -> Vec<TopicNode> {
    let by_id: HashMap<Uuid, &Topic> = topics.iter().map(|t| (t.id, t)).collect();

    let mut children: HashMap<Uuid, Vec<&Topic>> = HashMap::new();
    let mut roots: Vec<&Topic> = Vec::new();
    for topic in topics {
        match topic.parent_id {
            Some(parent) if parent != topic.id && by_id.contains_key(&parent) => {
                children.entry(parent).or_default().push(topic);
            }
            _ => roots.push(topic),
        }
    }
    for list in children.values_mut() {
        list.sort_by(|a, b| a.name.cmp(&b.name));
    }
    roots.sort_by(|a, b| a.name.cmp(&b.name));

    let mut visited = HashSet::with_capacity(topics.len());
    let mut forest: Vec<TopicNode> = roots
        .into_iter()
        .filter_map(|root| build_node(root, &children, &mut visited))
        .collect();

    // Anything left over only reaches itself through a cycle.
    let mut stranded: Vec<&Topic> = topics.iter().filter(|t| !visited.contains(&t.id)).collect();
    stranded.sort_by(|a, b| a.name.cmp(&b.name));
    for topic in stranded {
        if let Some(node) = build_node(topic, &children, &mut visited) {
            forest.push(node);
        }
    }

    forest
}

fn build_node(
    topic: &Topic,
    children: &HashMap<Uuid, Vec<&Topic>>,
    visited: &mut HashSet<Uuid>,
) -> Option<TopicNode> {
    if !visited.insert(topic.id) {
        return None;
    }

    let kids = children
        .get(&topic.id)
        .map(|list| {
            list.iter()
                .filter_map(|child| build_node(child, children, visited))
                .collect()
        })
        .unwrap_or_default();

    Some(TopicNode {
        id: topic.id,
        name: topic.name.clone(),
        slug: topic.slug.clone(),
        children: kids,
    })
}
