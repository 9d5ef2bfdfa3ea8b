//! Conversion runs
//!
//! [`ChartLoader`] is the entry point for a whole conversion. The phases run
//! strictly in order, each over the complete graph:
//!
//! 1. build the graph from the record stream
//! 2. resolve generations and columns
//! 3. assign rows
//! 4. optionally apply or write the layout override file
//!
//! String-based methods do the work; file-based methods read the file and
//! delegate.
//!
//! ```rust,ignore
//! let loader = ChartLoader::new()?;
//! let mut chart = loader.load("family.ged")?;
//! let layout = loader.layout_path("family.ged".as_ref(), &chart);
//! loader.apply_layout(&mut chart, &layout)?;
//! print!("{}", loader.serialize(&chart, "columns")?);
//! ```

use crate::chart::building::GraphBuilder;
use crate::chart::config::{load_defaults, ChartConfig};
use crate::chart::error::ChartError;
use crate::chart::formats::{ChartView, FormatRegistry};
use crate::chart::generations::{resolve_generations, GenerationSummary};
use crate::chart::layout::{apply_overrides, assign_slots, find_collisions};
use crate::chart::model::Graph;
use crate::chart::overrides::{
    dataset_name, default_layout_path, read_layout_if_present, write_layout, WriteOutcome,
};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// A fully laid out chart.
#[derive(Debug, Clone)]
pub struct Chart {
    pub graph: Graph,
    /// Dataset name: the last component of the `HEAD` file name, else the
    /// input file's stem.
    pub name: String,
    pub summary: GenerationSummary,
}

impl Chart {
    /// Renderer handoff for the current placement.
    pub fn view(&self) -> ChartView {
        ChartView::from_graph(&self.graph, &self.name, self.summary.max_generation)
    }
}

/// Primary API for conversion runs.
pub struct ChartLoader {
    config: ChartConfig,
    formats: FormatRegistry,
}

impl ChartLoader {
    /// Create a loader using the built-in default configuration.
    pub fn new() -> Result<Self, ChartError> {
        Ok(Self::with_config(load_defaults()?))
    }

    pub fn with_config(config: ChartConfig) -> Self {
        Self {
            config,
            formats: FormatRegistry::with_defaults(),
        }
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    // ===== STRING-BASED PROCESSING (core methods) =====

    /// Build and lay out a chart from source text.
    pub fn build(&self, source: &str) -> Result<Chart, ChartError> {
        let mut builder = GraphBuilder::new(self.config.limits);
        builder.feed_str(source)?;
        Ok(self.lay_out(builder.finish(), None))
    }

    /// Serialize a chart with a registered format.
    pub fn serialize(&self, chart: &Chart, format: &str) -> Result<String, ChartError> {
        Ok(self.formats.serialize(&chart.view(), format)?)
    }

    // ===== FILE-BASED PROCESSING =====

    /// Read, build and lay out the record stream at `path`.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Chart, ChartError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ChartError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let mut builder = GraphBuilder::new(self.config.limits);
        builder.feed_reader(BufReader::new(file), path)?;
        Ok(self.lay_out(builder.finish(), path.file_stem().and_then(|s| s.to_str())))
    }

    /// Where the override file for `input` lives by default.
    pub fn layout_path(&self, input: &Path, chart: &Chart) -> PathBuf {
        default_layout_path(input, &chart.graph, &self.config.layout.extension)
    }

    /// Apply the override file at `path` if there is one.
    ///
    /// Returns the number of individuals moved; a missing file moves none.
    pub fn apply_layout(&self, chart: &mut Chart, path: &Path) -> Result<usize, ChartError> {
        let Some(table) = read_layout_if_present(path)? else {
            tracing::debug!(path = %path.display(), "no layout file, using computed layout");
            return Ok(0);
        };

        let applied = apply_overrides(&mut chart.graph, &table);
        for (position, ids) in find_collisions(&chart.graph) {
            tracing::warn!(
                column = position.column,
                row = position.row,
                count = ids.len(),
                "several individuals share a slot after layout overrides"
            );
        }
        Ok(applied)
    }

    /// Write the override file for `chart`, refusing to replace an existing
    /// one unless `force` is set.
    pub fn write_layout(&self, chart: &Chart, path: &Path, force: bool) -> Result<WriteOutcome, ChartError> {
        write_layout(path, &chart.graph, force)
    }

    fn lay_out(&self, mut graph: Graph, fallback_name: Option<&str>) -> Chart {
        let summary = resolve_generations(&mut graph, self.config.generations.alignment);
        assign_slots(&mut graph);

        let name = dataset_name(&graph)
            .unwrap_or_else(|| fallback_name.unwrap_or_default().to_string());

        Chart {
            graph,
            name,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::model::Position;
    use std::fs;

    const SOURCE: &str = "\
0 HEAD
1 FILE smith
0 @I1@ INDI
1 NAME John /Smith/
1 SEX M
1 FAMS @F1@
0 @I2@ INDI
1 NAME Mary /Jones/
1 SEX F
1 FAMS @F1@
0 @I3@ INDI
1 NAME Tom /Smith/
1 FAMC @F1@
0 @F1@ FAM
1 HUSB @I1@
1 WIFE @I2@
1 CHIL @I3@
0 TRLR
";

    #[test]
    fn test_build_runs_all_phases() {
        let loader = ChartLoader::new().unwrap();
        let chart = loader.build(SOURCE).unwrap();
        assert_eq!(chart.name, "smith");
        assert_eq!(chart.summary.max_generation, 1);
        let tom = chart.graph.find_individual("I3").unwrap();
        assert_eq!(tom.generation, 1);
        assert_eq!(tom.position, Position { column: 0, row: 0 });
    }

    #[test]
    fn test_load_missing_file_is_unreadable() {
        let loader = ChartLoader::new().unwrap();
        let err = loader.load("/nonexistent/tree.ged").unwrap_err();
        assert!(matches!(err, ChartError::Unreadable { .. }));
    }

    #[test]
    fn test_load_uses_stem_without_head_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jones.ged");
        fs::write(&path, "0 @I1@ INDI\n").unwrap();

        let loader = ChartLoader::new().unwrap();
        let chart = loader.load(&path).unwrap();
        assert_eq!(chart.name, "jones");
        assert_eq!(loader.layout_path(&path, &chart), dir.path().join("jones.txt"));
    }

    #[test]
    fn test_load_latin1_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dupont.ged");
        fs::write(&path, b"0 @I1@ INDI\n1 NAME Ren\xe9 /Dupont/\n1 SEX M\n0 @I2@ INDI\n1 NAME Zo\xe9\n").unwrap();

        let loader = ChartLoader::new().unwrap();
        let chart = loader.load(&path).unwrap();
        assert_eq!(chart.graph.individual_count(), 2);
        assert_eq!(chart.graph.find_individual("I1").unwrap().sex, "M");
        assert_eq!(
            chart.graph.find_individual("I2").unwrap().position,
            Position { column: 0, row: 1 }
        );
    }

    #[test]
    fn test_write_then_apply_keeps_layout() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tree.ged");
        fs::write(&input, SOURCE).unwrap();

        let loader = ChartLoader::new().unwrap();
        let mut chart = loader.load(&input).unwrap();
        let before: Vec<Position> = chart.graph.individuals().map(|i| i.position).collect();

        let layout = loader.layout_path(&input, &chart);
        assert_eq!(layout, dir.path().join("smith.txt"));
        assert_eq!(loader.write_layout(&chart, &layout, false).unwrap(), WriteOutcome::Written);
        assert_eq!(loader.apply_layout(&mut chart, &layout).unwrap(), 0);

        let after: Vec<Position> = chart.graph.individuals().map(|i| i.position).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_head_file_path_names_layout_beside_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tree.ged");
        fs::write(&input, SOURCE.replace("1 FILE smith", "1 FILE /tmp/elsewhere/smith")).unwrap();

        let loader = ChartLoader::new().unwrap();
        let chart = loader.load(&input).unwrap();
        assert_eq!(chart.name, "smith");
        assert_eq!(loader.layout_path(&input, &chart), dir.path().join("smith.txt"));
        assert!(loader.serialize(&chart, "columns").unwrap().starts_with("Smith Family Tree\n"));
    }

    #[test]
    fn test_apply_missing_layout_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ChartLoader::new().unwrap();
        let mut chart = loader.build(SOURCE).unwrap();
        assert_eq!(loader.apply_layout(&mut chart, &dir.path().join("none.txt")).unwrap(), 0);
    }

    #[test]
    fn test_serialize_unknown_format() {
        let loader = ChartLoader::new().unwrap();
        let chart = loader.build(SOURCE).unwrap();
        assert!(matches!(
            loader.serialize(&chart, "pdf"),
            Err(ChartError::Format(_))
        ));
    }
}
