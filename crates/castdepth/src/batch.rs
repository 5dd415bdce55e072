//! Directory pairing and the batch driver.
//!
//! Target and reference casts of the same patient share a file name, one in
//! each directory. Every target file with a namesake in the reference
//! directory becomes a [`MeshPair`]; each pair is rendered and written to the
//! output directory as `<name up to the first dot>.png`.

use std::fs;
use std::path::{Path, PathBuf};

use castdepth_core::{BatchConfig, PairJob, RenderOptions};
use castdepth_render::{save_gray_png, Rasterizer};

use crate::error::{PipelineError, Result};
use crate::pipeline::render_pair;

/// A target cast and its matching reference cast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshPair {
    /// The shared file name.
    pub name: String,
    /// Path of the cast that is rotated and rendered.
    pub target: PathBuf,
    /// Path of the opposing cast.
    pub reference: PathBuf,
}

/// Result of matching one target directory against a reference directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pairing {
    /// Matched pairs, sorted by name.
    pub pairs: Vec<MeshPair>,
    /// Target files with no namesake in the reference directory.
    pub unmatched: Vec<String>,
}

/// Summary of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Number of depth maps written.
    pub rendered: usize,
    /// Names of pairs (or directories) that failed, when running with
    /// `keep_going`.
    pub failed: Vec<String>,
    /// Number of target files without a reference.
    pub unmatched: usize,
    /// Paths of the written images, in processing order.
    pub outputs: Vec<PathBuf>,
}

impl BatchReport {
    /// Returns true if nothing failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Lists the names of the regular files in `dir`, sorted.
///
/// Subdirectories and names that are not valid UTF-8 are skipped.
pub fn scan_dir(dir: &Path) -> Result<Vec<String>> {
    let read_dir_error = |source: std::io::Error| PipelineError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_dir_error)? {
        let entry = entry.map_err(read_dir_error)?;
        if !entry.path().is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => log::warn!("skipping non UTF-8 file name {name:?}"),
        }
    }
    names.sort();
    Ok(names)
}

/// Matches target files against reference files by exact file name.
pub fn match_pairs(target_dir: &Path, reference_dir: &Path) -> Result<Pairing> {
    let references = scan_dir(reference_dir)?;
    let mut pairing = Pairing::default();

    for name in scan_dir(target_dir)? {
        if references.binary_search(&name).is_ok() {
            pairing.pairs.push(MeshPair {
                target: target_dir.join(&name),
                reference: reference_dir.join(&name),
                name,
            });
        } else {
            pairing.unmatched.push(name);
        }
    }
    Ok(pairing)
}

/// Output image path for a cast file name: the name up to its first `.`,
/// with a `.png` extension.
#[must_use]
pub fn output_path(output_dir: &Path, file_name: &str) -> PathBuf {
    let stem = match file_name.split('.').next() {
        Some(stem) if !stem.is_empty() => stem,
        _ => file_name,
    };
    output_dir.join(format!("{stem}.png"))
}

/// Renders one pair and writes its depth map. Returns the written path.
pub fn process_pair(
    pair: &MeshPair,
    output_dir: &Path,
    options: &RenderOptions,
    rasterizer: &mut Rasterizer,
) -> Result<PathBuf> {
    let render = render_pair(&pair.target, &pair.reference, options, rasterizer)?;
    let path = output_path(output_dir, &pair.name);
    save_gray_png(&path, &render.image)?;
    Ok(path)
}

/// Runs every job of a batch sequentially.
///
/// Without `keep_going` the first failure aborts the run; with it, failures
/// are logged and collected in the report. One rasterizer is created up
/// front and shared by every pair.
pub fn run_batch(config: &BatchConfig) -> Result<BatchReport> {
    fs::create_dir_all(&config.output_dir).map_err(|source| PipelineError::OutputDir {
        path: config.output_dir.clone(),
        source,
    })?;

    let mut rasterizer = Rasterizer::new(config.render.backend)?;
    log::info!(
        "rasterizing on the {}",
        if rasterizer.is_gpu() { "GPU" } else { "CPU" }
    );

    let mut report = BatchReport::default();
    for job in config.all_jobs() {
        if let Err(err) = run_job(&job, config, &mut rasterizer, &mut report) {
            if !config.keep_going {
                return Err(err);
            }
            log::warn!("{err}");
            report.failed.push(job.target_dir.display().to_string());
        }
    }

    log::info!(
        "batch finished: {} rendered, {} failed, {} without reference",
        report.rendered,
        report.failed.len(),
        report.unmatched
    );
    Ok(report)
}

fn run_job(
    job: &PairJob,
    config: &BatchConfig,
    rasterizer: &mut Rasterizer,
    report: &mut BatchReport,
) -> Result<()> {
    log::info!(
        "matching {} against {}",
        job.target_dir.display(),
        job.reference_dir.display()
    );
    let pairing = match_pairs(&job.target_dir, &job.reference_dir)?;
    for name in &pairing.unmatched {
        log::debug!("no reference for {name}");
    }
    report.unmatched += pairing.unmatched.len();

    for pair in &pairing.pairs {
        match process_pair(pair, &config.output_dir, &config.render, rasterizer) {
            Ok(path) => {
                log::info!("{} -> {}", pair.name, path.display());
                report.rendered += 1;
                report.outputs.push(path);
            }
            Err(source) => {
                let err = PipelineError::Pair {
                    name: pair.name.clone(),
                    source: Box::new(source),
                };
                if !config.keep_going {
                    return Err(err);
                }
                log::warn!("{err}");
                report.failed.push(pair.name.clone());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_output_path_cuts_at_first_dot() {
        let out = Path::new("/out");
        assert_eq!(output_path(out, "data0004.ply"), Path::new("/out/data0004.png"));
        assert_eq!(
            output_path(out, "case12.upper.stl"),
            Path::new("/out/case12.png")
        );
        assert_eq!(output_path(out, "noext"), Path::new("/out/noext.png"));
        assert_eq!(output_path(out, ".hidden"), Path::new("/out/.hidden.png"));
    }

    #[test]
    fn test_scan_dir_sorted_files_only() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.ply");
        touch(dir.path(), "a.ply");
        fs::create_dir(dir.path().join("c.ply")).unwrap();
        assert_eq!(scan_dir(dir.path()).unwrap(), vec!["a.ply", "b.ply"]);
    }

    #[test]
    fn test_scan_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            scan_dir(&dir.path().join("absent")),
            Err(PipelineError::ReadDir { .. })
        ));
    }

    #[test]
    fn test_match_pairs_by_exact_name() {
        let down = tempfile::tempdir().unwrap();
        let up = tempfile::tempdir().unwrap();
        for name in ["data0001.ply", "data0002.ply", "data0003.ply"] {
            touch(down.path(), name);
        }
        for name in ["data0002.ply", "data0001.ply", "DATA0003.ply", "data0009.ply"] {
            touch(up.path(), name);
        }

        let pairing = match_pairs(down.path(), up.path()).unwrap();
        let names: Vec<_> = pairing.pairs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["data0001.ply", "data0002.ply"]);
        assert_eq!(pairing.unmatched, vec!["data0003.ply"]);
        assert_eq!(pairing.pairs[0].target, down.path().join("data0001.ply"));
        assert_eq!(pairing.pairs[0].reference, up.path().join("data0001.ply"));
    }

    #[test]
    fn test_report_success() {
        let mut report = BatchReport::default();
        assert!(report.is_success());
        report.failed.push("x".into());
        assert!(!report.is_success());
    }

    proptest! {
        #[test]
        fn output_name_never_keeps_a_dot(stem in "[a-z0-9_]{1,12}", ext in "[a-z.]{0,8}") {
            let name = format!("{stem}.{ext}");
            let path = output_path(Path::new("out"), &name);
            prop_assert_eq!(path, Path::new("out").join(format!("{stem}.png")));
        }
    }
}
