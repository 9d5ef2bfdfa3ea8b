//! Generation resolver
//!
//! Three phases over a fully built graph:
//!
//! 1. Ancestry depth. From an individual's parent family, keep stepping to the
//!    husband's parent family, or failing that the wife's, counting every
//!    family visited. Individuals without a parent family stay at 0.
//! 2. Marriage alignment. Everyone takes the generation of a deeper spouse.
//!    Spouses come from `FAMS` links and from the families' own `HUSB`/`WIFE`
//!    lines, so a partner with no `FAMS` of their own is still aligned.
//! 3. Columns. `column = max_generation - generation`, so the most deeply
//!    descended individuals sit in column 0 and the earliest ancestors in the
//!    highest column.
//!
//! Depth is an estimate: the walk is greedy along the paternal line and
//! phase 2 patches the couples it gets wrong.

use crate::chart::config::Alignment;
use crate::chart::model::{FamilyId, Graph, IndividualId};
use std::collections::HashSet;

/// Result of a resolver run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationSummary {
    /// Deepest ancestry depth found in phase 1.
    pub max_generation: u32,
    /// Number of alignment passes that were run.
    pub alignment_passes: usize,
}

/// Run all three phases, storing `generation` and `position.column` on every
/// individual.
pub fn resolve_generations(graph: &mut Graph, alignment: Alignment) -> GenerationSummary {
    let max_generation = assign_ancestry_depths(graph);
    let alignment_passes = align_marriages(graph, alignment);
    assign_columns(graph, max_generation);

    tracing::info!(max_generation, alignment_passes, "generations resolved");
    GenerationSummary {
        max_generation,
        alignment_passes,
    }
}

/// Phase 1. Returns the maximum depth.
pub fn assign_ancestry_depths(graph: &mut Graph) -> u32 {
    let mut max_generation = 0;
    for id in graph.individual_ids() {
        let depth = ancestry_depth(graph, id);
        graph.individual_mut(id).generation = depth;
        max_generation = max_generation.max(depth);
    }
    max_generation
}

/// Number of families on the greedy ancestry walk starting at `id`.
///
/// A family seen twice ends the walk, so malformed data with a parentage
/// cycle still terminates.
pub fn ancestry_depth(graph: &Graph, id: IndividualId) -> u32 {
    let mut visited: HashSet<FamilyId> = HashSet::new();
    let mut current = graph.individual(id).parent_family;
    let mut hops = 0;

    while let Some(family_id) = current {
        if !visited.insert(family_id) {
            tracing::warn!(
                xref = %graph.individual(id).xref,
                family = %graph.family(family_id).xref,
                "parentage cycle, ancestry walk stopped"
            );
            break;
        }
        hops += 1;

        let family = graph.family(family_id);
        let paternal = family
            .husband
            .and_then(|husband| graph.individual(husband).parent_family);
        current = match (paternal, family.wife) {
            (Some(next), _) => Some(next),
            (None, Some(wife)) => graph.individual(wife).parent_family,
            (None, None) => None,
        };
    }

    hops
}

/// Phase 2. Returns the number of passes run.
pub fn align_marriages(graph: &mut Graph, alignment: Alignment) -> usize {
    let partners = partners(graph);
    match alignment {
        Alignment::SinglePass => {
            align_pass(graph, &partners);
            1
        }
        Alignment::FixedPoint => {
            // Generations only grow and never past the phase 1 maximum, so
            // this settles; the bound is a backstop.
            let limit = graph.individual_count() + 1;
            let mut passes = 0;
            loop {
                passes += 1;
                if !align_pass(graph, &partners) || passes >= limit {
                    break;
                }
            }
            passes
        }
    }
}

/// Spouses of every individual, indexed like [`Graph::individual_ids`].
fn partners(graph: &Graph) -> Vec<Vec<IndividualId>> {
    graph
        .individual_ids()
        .into_iter()
        .map(|id| {
            graph
                .spouse_families_of(id)
                .into_iter()
                .filter_map(|family_id| graph.partner_in(id, family_id))
                .collect()
        })
        .collect()
}

/// One forward pass in id order. Returns true if any generation changed.
fn align_pass(graph: &mut Graph, partners: &[Vec<IndividualId>]) -> bool {
    let mut changed = false;

    for (id, spouses) in graph.individual_ids().into_iter().zip(partners) {
        let deepest_spouse = spouses
            .iter()
            .map(|spouse| graph.individual(*spouse).generation)
            .max();

        if let Some(generation) = deepest_spouse {
            if generation > graph.individual(id).generation {
                graph.individual_mut(id).generation = generation;
                changed = true;
            }
        }
    }

    changed
}

/// Phase 3.
pub fn assign_columns(graph: &mut Graph, max_generation: u32) {
    for person in graph.individuals_mut() {
        person.position.column = max_generation.saturating_sub(person.generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::building::build_graph;
    use crate::chart::config::LimitsConfig;

    fn limits() -> LimitsConfig {
        LimitsConfig {
            individuals: 255,
            families: 127,
            spouse_families: 4,
            children: 15,
        }
    }

    fn resolved(source: &str, alignment: Alignment) -> (Graph, GenerationSummary) {
        let mut graph = build_graph(source, limits()).expect("source to build");
        let summary = resolve_generations(&mut graph, alignment);
        (graph, summary)
    }

    fn generation(graph: &Graph, xref: &str) -> u32 {
        graph.find_individual(xref).unwrap().generation
    }

    fn column(graph: &Graph, xref: &str) -> u32 {
        graph.find_individual(xref).unwrap().position.column
    }

    const THREE_GENERATIONS: &str = "\
0 @I1@ INDI
1 SEX M
1 FAMS @F1@
0 @I2@ INDI
1 SEX F
1 FAMS @F1@
0 @I3@ INDI
1 SEX M
1 FAMC @F1@
1 FAMS @F2@
0 @I4@ INDI
1 SEX F
1 FAMS @F2@
0 @I5@ INDI
1 FAMC @F2@
0 @F1@ FAM
1 HUSB @I1@
1 WIFE @I2@
1 CHIL @I3@
0 @F2@ FAM
1 HUSB @I3@
1 WIFE @I4@
1 CHIL @I5@
";

    #[test]
    fn test_single_individual() {
        let (graph, summary) = resolved("0 @I1@ INDI\n1 NAME John /Smith/\n1 SEX M\n", Alignment::FixedPoint);
        assert_eq!(summary.max_generation, 0);
        assert_eq!(generation(&graph, "I1"), 0);
        assert_eq!(column(&graph, "I1"), 0);
    }

    #[test]
    fn test_ancestry_depth_counts_families() {
        let (graph, summary) = resolved(THREE_GENERATIONS, Alignment::SinglePass);
        assert_eq!(summary.max_generation, 2);
        assert_eq!(generation(&graph, "I5"), 2);
        assert_eq!(generation(&graph, "I1"), 0);
        assert_eq!(generation(&graph, "I2"), 0);
    }

    #[test]
    fn test_spouse_raised_to_partner_generation() {
        let (graph, _) = resolved(THREE_GENERATIONS, Alignment::SinglePass);
        // I4 has no parents of her own but married I3.
        assert_eq!(generation(&graph, "I3"), 1);
        assert_eq!(generation(&graph, "I4"), 1);
    }

    #[test]
    fn test_columns_descend_from_ancestors() {
        let (graph, _) = resolved(THREE_GENERATIONS, Alignment::FixedPoint);
        assert_eq!(column(&graph, "I5"), 0);
        assert_eq!(column(&graph, "I3"), 1);
        assert_eq!(column(&graph, "I4"), 1);
        assert_eq!(column(&graph, "I1"), 2);
        assert_eq!(column(&graph, "I2"), 2);
    }

    #[test]
    fn test_walk_falls_back_to_wife_line() {
        let source = "\
0 @I1@ INDI
1 FAMC @F1@
0 @F1@ FAM
1 HUSB @I2@
1 WIFE @I3@
0 @I3@ INDI
1 FAMC @F2@
0 @F2@ FAM
1 WIFE @I4@
";
        let (graph, _) = resolved(source, Alignment::FixedPoint);
        // F1 (husband has no parents) -> wife's F2 -> F2 has no husband,
        // its wife has no parents.
        assert_eq!(generation(&graph, "I1"), 2);
        assert_eq!(generation(&graph, "I3"), 1);
    }

    #[test]
    fn test_family_without_parents_counts_one() {
        let (graph, _) = resolved("0 @I1@ INDI\n1 FAMC @F1@\n0 @F1@ FAM\n", Alignment::FixedPoint);
        assert_eq!(generation(&graph, "I1"), 1);
    }

    #[test]
    fn test_parentage_cycle_terminates() {
        let source = "\
0 @I1@ INDI
1 FAMC @F1@
0 @F1@ FAM
1 HUSB @I1@
";
        let (graph, _) = resolved(source, Alignment::FixedPoint);
        assert_eq!(generation(&graph, "I1"), 1);
    }

    // P2 married P1 and then P3, whose ancestry is two generations deep. A
    // single pass raises P2 after P1 was already visited.
    const REMARRIAGE: &str = "\
0 @P1@ INDI
1 SEX M
1 FAMS @F1@
0 @P2@ INDI
1 SEX F
1 FAMS @F1@
1 FAMS @F2@
0 @P3@ INDI
1 SEX M
1 FAMS @F2@
1 FAMC @F3@
0 @G1@ INDI
1 SEX M
1 FAMC @F4@
0 @GG@ INDI
1 SEX M
0 @F1@ FAM
1 HUSB @P1@
1 WIFE @P2@
0 @F2@ FAM
1 HUSB @P3@
1 WIFE @P2@
0 @F3@ FAM
1 HUSB @G1@
0 @F4@ FAM
1 HUSB @GG@
";

    #[test]
    fn test_single_pass_under_corrects_remarriage() {
        let (graph, summary) = resolved(REMARRIAGE, Alignment::SinglePass);
        assert_eq!(summary.alignment_passes, 1);
        assert_eq!(generation(&graph, "P3"), 2);
        assert_eq!(generation(&graph, "P2"), 2);
        assert_eq!(generation(&graph, "P1"), 0);
    }

    #[test]
    fn test_fixed_point_aligns_every_couple() {
        let (graph, summary) = resolved(REMARRIAGE, Alignment::FixedPoint);
        assert_eq!(summary.alignment_passes, 3);
        for family in graph.families() {
            if let (Some(husband), Some(wife)) = (family.husband, family.wife) {
                assert_eq!(
                    graph.individual(husband).generation,
                    graph.individual(wife).generation,
                    "couple in {} not aligned",
                    family.xref
                );
            }
        }
        assert_eq!(generation(&graph, "P1"), 2);
        assert_eq!(column(&graph, "P1"), 0);
    }

    #[test]
    fn test_spouse_without_fams_is_aligned() {
        let source = "\
0 @I1@ INDI
1 SEX M
1 FAMS @F1@
0 @I2@ INDI
1 SEX F
1 FAMS @F1@
0 @I3@ INDI
1 SEX M
1 FAMC @F1@
1 FAMS @F2@
0 @I4@ INDI
1 SEX F
0 @F1@ FAM
1 HUSB @I1@
1 WIFE @I2@
1 CHIL @I3@
0 @F2@ FAM
1 HUSB @I3@
1 WIFE @I4@
";
        for alignment in [Alignment::SinglePass, Alignment::FixedPoint] {
            let (graph, _) = resolved(source, alignment);
            assert_eq!(generation(&graph, "I3"), 1);
            assert_eq!(generation(&graph, "I4"), 1, "{alignment:?}");
            assert_eq!(column(&graph, "I4"), column(&graph, "I3"));
        }
    }

    #[test]
    fn test_role_decides_partner_over_recorded_sex() {
        // I2 is recorded male but is the wife of F1.
        let source = "\
0 @I1@ INDI
1 SEX F
1 FAMC @F2@
1 FAMS @F1@
0 @I2@ INDI
1 SEX M
1 FAMS @F1@
0 @F1@ FAM
1 HUSB @I1@
1 WIFE @I2@
0 @F2@ FAM
";
        let (graph, _) = resolved(source, Alignment::FixedPoint);
        assert_eq!(generation(&graph, "I1"), 1);
        assert_eq!(generation(&graph, "I2"), 1);
    }

    #[test]
    fn test_unknown_sex_follows_husband() {
        let source = "\
0 @I1@ INDI
1 FAMS @F1@
0 @I2@ INDI
1 SEX M
1 FAMC @F2@
0 @F1@ FAM
1 HUSB @I2@
1 WIFE @I1@
";
        let (graph, _) = resolved(source, Alignment::FixedPoint);
        assert_eq!(generation(&graph, "I1"), 1);
    }
}
