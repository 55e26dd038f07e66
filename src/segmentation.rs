use std::collections::HashMap;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::records::{Product, ProductSegmentation};

/// What to do with a collection value that only one product carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SingletonGroups {
    /// Synthesize a parent holding the single product.
    #[default]
    Wrap,
    /// Attach the product directly under the products branch.
    Inline,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentationPolicy {
    pub singletons: SingletonGroups,
}

/// Groups products by their `collection` value into synthetic parents.
///
/// Groups come out in the order their key first appears. Products without a
/// collection are skipped. Never fails: members lacking dates simply do not
/// take part in the start/end selection.
pub fn group_segmentations(
    products: &[Product],
    policy: SegmentationPolicy,
) -> Vec<ProductSegmentation> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&Product>> = HashMap::new();
    for product in products {
        let Some(key) = product.collection_key() else {
            continue;
        };
        groups
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(product);
    }

    order
        .into_iter()
        .filter_map(|key| {
            let members = groups.remove(key)?;
            if members.len() == 1 && policy.singletons == SingletonGroups::Inline {
                tracing::debug!(collection = key, "singleton collection left inline");
                return None;
            }
            Some(segmentation_from(key, &members))
        })
        .collect()
}

fn segmentation_from(key: &str, members: &[&Product]) -> ProductSegmentation {
    // first minimum among members that have a start, first member otherwise
    let earliest = members
        .iter()
        .filter(|product| product.start.is_some())
        .min_by_key(|product| product.start)
        .or_else(|| members.first())
        .copied();
    // reversed so that ties resolve to the first occurrence; `None` ends rank lowest
    let latest = members
        .iter()
        .rev()
        .max_by_key(|product| product.end)
        .copied();

    let mut regions: Vec<&str> = Vec::new();
    for region in members
        .iter()
        .filter_map(|product| product.region.as_deref())
        .map(str::trim)
        .filter(|region| !region.is_empty())
    {
        if !regions.contains(&region) {
            regions.push(region);
        }
    }

    tracing::debug!(
        collection = key,
        members = members.len(),
        "synthesized segmentation parent"
    );

    ProductSegmentation {
        title: key.to_string(),
        project: latest
            .map(|product| product.project.clone())
            .unwrap_or_default(),
        themes: union_first_seen(members.iter().map(|product| &product.themes)),
        start: earliest.and_then(|product| product.start),
        end: latest.and_then(|product| product.end),
        geometry: earliest.and_then(|product| product.geometry.clone()),
        released: earliest.and_then(|product| product.released),
        region: (!regions.is_empty()).then(|| regions.join(", ")),
        variables: union_first_seen(members.iter().map(|product| &product.variables)),
        eo_missions: union_first_seen(members.iter().map(|product| &product.eo_missions)),
    }
}

fn union_first_seen<'a>(lists: impl Iterator<Item = &'a Vec<String>>) -> Vec<String> {
    let mut union: Vec<String> = Vec::new();
    for value in lists.flatten() {
        if !union.contains(value) {
            union.push(value.clone());
        }
    }
    union
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, collection: Option<&str>) -> Product {
        Product {
            id: id.to_string(),
            title: id.to_string(),
            project: "P".to_string(),
            collection: collection.map(str::to_string),
            ..Product::default()
        }
    }

    #[test]
    fn skips_products_without_collection() {
        let products = vec![product("a", None), product("b", Some("  "))];
        assert!(group_segmentations(&products, SegmentationPolicy::default()).is_empty());
    }

    #[test]
    fn singleton_policy() {
        let products = vec![
            product("a", Some("X")),
            product("b", Some("Y")),
            product("c", Some("Y")),
        ];
        let wrapped = group_segmentations(&products, SegmentationPolicy::default());
        assert_eq!(wrapped.len(), 2);

        let inline = group_segmentations(
            &products,
            SegmentationPolicy {
                singletons: SingletonGroups::Inline,
            },
        );
        assert_eq!(inline.len(), 1);
        assert_eq!(inline[0].title, "Y");
    }

    #[test]
    fn union_flattens_every_member_list() {
        let mut a = product("a", Some("X"));
        a.variables = vec!["v1".to_string(), "v2".to_string()];
        let mut b = product("b", Some("X"));
        b.variables = vec!["v2".to_string(), "v3".to_string()];

        let groups = group_segmentations(&[a, b], SegmentationPolicy::default());
        assert_eq!(groups[0].variables, vec!["v1", "v2", "v3"]);
    }
}
