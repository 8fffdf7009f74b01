//! Anatomical hierarchy of the mapzebrain region annotations.

use std::collections::HashSet;

pub struct RegionNode {
    pub name: &'static str,
    pub children: &'static [RegionNode],
}

macro_rules! region {
    ($name:expr $(,)?) => {
        RegionNode {
            name: $name,
            children: &[],
        }
    };
    ($name:expr, [$($child:expr),* $(,)?] $(,)?) => {
        RegionNode {
            name: $name,
            children: &[$($child),*],
        }
    };
}

pub static REGION_TREE: &[RegionNode] = &[
    region!(
        "prosencephalon (forebrain)",
        [
            region!(
                "telencephalon",
                [
                    region!("olfactory bulb"),
                    region!("dorsal telencephalon (pallium)"),
                    region!("ventral telencephalon (subpallium)"),
                ],
            ),
            region!(
                "hypothalamus",
                [
                    region!("rostral hypothalamus"),
                    region!(
                        "intermediate hypothalamus (entire)",
                        [
                            region!("intermediate hypothalamus (remaining)"),
                            region!("diffuse nucleus of the inferior lobe"),
                        ],
                    ),
                    region!("caudal hypothalamus"),
                    region!("pituitary (hypophysis)"),
                ],
            ),
            region!(
                "preoptic region",
                [
                    region!("retinal arborization field 1"),
                    region!("retinal arborization field 2"),
                ],
            ),
            region!("posterior tuberculum (basal part of prethalamus and thalamus)"),
            region!("retina"),
            region!(
                "eminentia thalami",
                [
                    region!("ventral entopeduncular nucleus"),
                    region!("eminentia thalami (remaining)"),
                ],
            ),
            region!(
                "prethalamus (ventral thalamus)",
                [region!("retinal arborization field 3")],
            ),
            region!(
                "thalamus (alar prosomere 2, dorsal thalamus)",
                [
                    region!("pineal complex (epiphysis)"),
                    region!(
                        "habenula",
                        [region!("dorsal habenula"), region!("ventral habenula")],
                    ),
                    region!(
                        "dorsal thalamus proper",
                        [region!("retinal arborization field 4")],
                    ),
                ],
            ),
            region!(
                "pretectum",
                [
                    region!("retinal arborization field 5"),
                    region!("retinal arborization field 6"),
                    region!("retinal arborization field 7"),
                    region!("retinal arborization field 8"),
                    region!("retinal arborization field 9"),
                ],
            ),
            region!(
                "posterior tuberculum, posterior part (basal prosomere 2, dorsal posterior tuberculum)",
            ),
            region!(
                "region of the nucleus of the medial longitudinal fascicle (basal prosomere 1)",
                [region!("nucleus of the medial longitudinal fascicle")],
            ),
        ],
    ),
    region!(
        "mesencephalon (midbrain)",
        [
            region!(
                "tegmentum",
                [
                    region!(
                        "medial tegmentum (entire)",
                        [
                            region!("medial tegmentum (remaining)"),
                            region!("oculomotor nucleus"),
                        ],
                    ),
                    region!("lateral tegmentum"),
                ],
            ),
            region!(
                "tectum & tori",
                [
                    region!("torus longitudinalis"),
                    region!(
                        "tectum",
                        [
                            region!(
                                "tectal neuropil",
                                [
                                    region!("boundary zone between SFGS and SGC"),
                                    region!("stratum opticum (SO)"),
                                    region!("stratum fibrosum et griseum superficiale (SFGS)"),
                                    region!("stratum marginale (SM)"),
                                    region!("boundary zone between SAC and periventricular layer"),
                                    region!("stratum album centrale (SAC)"),
                                    region!("stratum griseum centrale (SGC)"),
                                ],
                            ),
                            region!("periventricular layer"),
                        ],
                    ),
                    region!("torus semicircularis"),
                ],
            ),
        ],
    ),
    region!(
        "rhombencephalon (hindbrain)",
        [
            region!("cerebellum"),
            region!(
                "medulla oblongata",
                [region!(
                    "superior medulla oblongata",
                    [
                        region!(
                            "superior dorsal medulla oblongata",
                            [
                                region!(
                                    "superior dorsal medulla oblongata stripe 1 (entire)",
                                    [
                                        region!("trochlear motor nucleus"),
                                        region!("superior dorsal medulla oblongata stripe 1 (remaining)"),
                                    ],
                                ),
                                region!("superior dorsal medulla oblongata stripe 2&3"),
                                region!("superior dorsal medulla oblongata stripe 4"),
                                region!("superior dorsal medulla oblongata stripe 5"),
                                region!("medial octavolateralis nucleus"),
                            ],
                        ),
                        region!(
                            "superior ventral medulla oblongata (entire)",
                            [
                                region!("anterior (dorsal) trigeminal motor nucleus"),
                                region!("superior raphe"),
                                region!("interpeduncular nucleus"),
                                region!("locus coeruleus"),
                                region!("posterior (ventral) trigeminal motor nucleus"),
                                region!("superior ventral medulla oblongata (remaining)"),
                            ],
                        ),
                    ],
                )],
            ),
        ],
    ),
    region!(
        "peripheral nervous system",
        [
            region!("olfactory epithelium"),
            region!("anterior lateral line ganglion"),
            region!("trigeminal ganglion"),
            region!("posterior lateral line ganglion"),
            region!("octaval ganglion"),
            region!("glossopharyngeal ganglion"),
        ],
    ),
];

/// One tree entry in pre-order; `id` is the continuous index used for color assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionEntry {
    pub id: usize,
    pub name: &'static str,
    pub depth: usize,
    pub parent: Option<usize>,
    pub has_children: bool,
}

#[derive(Debug, Clone)]
pub struct RegionCatalog {
    entries: Vec<RegionEntry>,
}

impl Default for RegionCatalog {
    fn default() -> Self {
        Self::new(REGION_TREE)
    }
}

impl RegionCatalog {
    pub fn new(roots: &'static [RegionNode]) -> Self {
        let mut entries = Vec::new();
        for root in roots {
            Self::flatten(root, 0, None, &mut entries);
        }
        Self { entries }
    }

    fn flatten(
        node: &'static RegionNode,
        depth: usize,
        parent: Option<usize>,
        entries: &mut Vec<RegionEntry>,
    ) {
        let id = entries.len();
        entries.push(RegionEntry {
            id,
            name: node.name,
            depth,
            parent,
            has_children: !node.children.is_empty(),
        });
        for child in node.children {
            Self::flatten(child, depth + 1, Some(id), entries);
        }
    }

    pub fn entries(&self) -> &[RegionEntry] {
        &self.entries
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    pub fn id_of(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.id)
    }

    /// Entries to show for `query`: matches, their ancestors, and anything selected.
    /// An empty query shows the whole tree.
    pub fn search(&self, query: &str, selected: &HashSet<String>) -> HashSet<usize> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.entries.iter().map(|entry| entry.id).collect();
        }

        let mut visible = HashSet::new();
        for entry in &self.entries {
            let hit = entry.name.to_lowercase().contains(&query) || selected.contains(entry.name);
            if !hit {
                continue;
            }
            let mut current = Some(entry.id);
            while let Some(id) = current {
                if !visible.insert(id) {
                    break;
                }
                current = self.entries[id].parent;
            }
        }
        visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_preorder() {
        let catalog = RegionCatalog::default();
        assert_eq!(catalog.id_of("prosencephalon (forebrain)"), Some(0));
        assert_eq!(catalog.id_of("telencephalon"), Some(1));
        assert_eq!(catalog.id_of("olfactory bulb"), Some(2));
        assert!(catalog.contains("oculomotor nucleus"));
        assert!(!catalog.contains("cortex"));
    }

    #[test]
    fn search_keeps_ancestors_of_matches() {
        let catalog = RegionCatalog::default();
        let visible = catalog.search("habenula", &HashSet::new());

        let names: HashSet<&str> = visible
            .iter()
            .map(|id| catalog.entries()[*id].name)
            .collect();
        assert!(names.contains("dorsal habenula"));
        assert!(names.contains("habenula"));
        assert!(names.contains("thalamus (alar prosomere 2, dorsal thalamus)"));
        assert!(names.contains("prosencephalon (forebrain)"));
        assert!(!names.contains("retina"));
    }

    #[test]
    fn selected_regions_stay_visible_while_searching() {
        let catalog = RegionCatalog::default();
        let selected = HashSet::from(["retina".to_string()]);
        let visible = catalog.search("habenula", &selected);
        assert!(visible.contains(&catalog.id_of("retina").unwrap()));
    }

    #[test]
    fn empty_query_shows_everything() {
        let catalog = RegionCatalog::default();
        assert_eq!(
            catalog.search("  ", &HashSet::new()).len(),
            catalog.entries().len()
        );
    }
}
