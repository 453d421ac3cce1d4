use std::collections::HashSet;

use chrono::Utc;
use library_core::models::org::validate_slug;
use library_core::models::topic::slugify;
use library_core::models::{build_tree, MessageContent, NewTopic, PageRequest, Topic, TopicNode};
use proptest::prelude::*;
use uuid::Uuid;

fn collect_ids(nodes: &[TopicNode], out: &mut Vec<Uuid>) {
    for node in nodes {
        out.push(node.id);
        collect_ids(&node.children, out);
    }
}

// Topics whose parent links point anywhere: nowhere, at themselves, at
// each other (cycles included), or at ids outside the list.
fn arb_topics() -> impl Strategy<Value = Vec<Topic>> {
    (1usize..30).prop_flat_map(|n| {
        prop::collection::vec(
            ("[a-z]{1,8}", prop::option::of(0usize..n + 5)),
            n,
        )
        .prop_map(move |specs| {
            let ids: Vec<Uuid> = (0..n).map(|_| Uuid::new_v4()).collect();
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (name, parent))| Topic {
                    id: ids[i],
                    slug: name.clone(),
                    name,
                    parent_id: parent.map(|p| ids.get(p).copied().unwrap_or_else(Uuid::new_v4)),
                    created_at: Utc::now(),
                })
                .collect()
        })
    })
}

proptest! {
    /// Property: slugify only ever produces valid slugs (or nothing)
    #[test]
    fn prop_slugify_output_is_valid_slug(name in ".{0,120}") {
        let slug = slugify(&name);
        if !slug.is_empty() {
            prop_assert!(validate_slug(&slug).is_ok(), "bad slug {:?} from {:?}", slug, name);
        }
    }

    /// Property: any name with a letter or digit in any script makes a topic
    #[test]
    fn prop_named_topics_always_get_a_slug(name in "\\PC{1,60}") {
        prop_assume!(name.chars().any(char::is_alphanumeric));
        let topic = NewTopic::new(&name, None);
        prop_assert!(topic.is_ok(), "{:?} rejected: {:?}", name, topic);
    }

    /// Property: every topic lands in the tree exactly once, cycles or not
    #[test]
    fn prop_build_tree_keeps_every_topic_once(topics in arb_topics()) {
        let forest = build_tree(&topics);

        let mut seen = Vec::new();
        collect_ids(&forest, &mut seen);

        let unique: HashSet<Uuid> = seen.iter().copied().collect();
        prop_assert_eq!(seen.len(), topics.len());
        prop_assert_eq!(unique.len(), topics.len());
        for topic in &topics {
            prop_assert!(unique.contains(&topic.id));
        }
    }

    /// Property: a page never exceeds per_page and always reports the full total
    #[test]
    fn prop_page_slice_is_bounded(
        len in 0usize..250,
        page in 0u32..20,
        per_page in 0u32..200,
    ) {
        let all: Vec<usize> = (0..len).collect();
        let request = PageRequest::new(page, per_page);
        let result = request.slice(&all);

        prop_assert!(result.items.len() <= request.per_page as usize);
        prop_assert_eq!(result.total, len as i64);
        if let Some(first) = result.items.first() {
            prop_assert_eq!(*first as i64, request.offset());
        }
    }

    /// Property: content length is measured in characters, not bytes
    #[test]
    fn prop_message_length_counts_chars(ch in prop::char::range('\u{80}', '\u{10FFFF}')) {
        prop_assume!(!ch.is_whitespace());
        let at_limit: String = std::iter::repeat(ch).take(10_000).collect();
        prop_assert!(MessageContent::new(&at_limit).is_ok());

        let over: String = std::iter::repeat(ch).take(10_001).collect();
        prop_assert!(MessageContent::new(&over).is_err());
    }
}

#[test]
fn whitespace_only_message_is_rejected() {
    assert!(MessageContent::new(" \n\t ").is_err());
    assert_eq!(MessageContent::new("  hi  ").unwrap().as_str(), "hi");
}
