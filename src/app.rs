use std::time::{Duration, Instant};

use camino::Utf8Path;
use serde::Serialize;

use crate::builder::{BuildOptions, CatalogBuilder, CatalogIndex, CatalogInputs};
use crate::catalog::{Catalog, ModificationTimes};
use crate::config::ResolvedConfig;
use crate::error::CatalogError;
use crate::linker::{CrossLinker, LinkSummary};
use crate::metrics::{CatalogMetrics, GlobalSummary, build_metrics};
use crate::tables::DataDir;
use crate::validate::{ValidationReport, validate};
use crate::writer::{WriteOptions, copy_images, write_catalog};

#[derive(Debug, Clone, Serialize)]
pub struct ValidateResult {
    pub data_dir: String,
    pub valid: bool,
    pub issue_count: usize,
    pub report: ValidationReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildResult {
    pub data_dir: String,
    pub out_dir: String,
    pub containers: usize,
    pub documents: usize,
    pub relations: usize,
    pub attachments: usize,
    pub images: usize,
    pub issue_count: usize,
    pub summary: GlobalSummary,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BuildRunOptions {
    /// Refuse to build when validation reports anything.
    pub strict: bool,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Everything the core produces for one set of inputs.
#[derive(Debug, Clone)]
pub struct AssembledCatalog {
    pub catalog: Catalog,
    pub index: CatalogIndex,
    pub links: LinkSummary,
    pub metrics: CatalogMetrics,
}

/// Groups, builds, links and measures in that order. Performs no I/O.
pub fn assemble(
    inputs: &CatalogInputs,
    options: &BuildOptions,
) -> Result<AssembledCatalog, CatalogError> {
    let (mut catalog, index) = CatalogBuilder::new(options.clone()).build(inputs)?;
    let links = CrossLinker::new(&index).link(&mut catalog)?;
    let metrics = build_metrics(&catalog)?;
    Ok(AssembledCatalog {
        catalog,
        index,
        links,
        metrics,
    })
}

pub struct App<T: ModificationTimes> {
    times: T,
}

impl<T: ModificationTimes> App<T> {
    pub fn new(times: T) -> Self {
        Self { times }
    }

    pub fn validate(
        &self,
        data_dir: &Utf8Path,
        sink: &dyn ProgressSink,
    ) -> Result<ValidateResult, CatalogError> {
        let started = Instant::now();
        sink.event(ProgressEvent {
            message: format!("phase=Load; reading tables from {data_dir}"),
            elapsed: None,
        });
        let (inputs, mut report) = DataDir::new(data_dir).load()?;
        report.merge(validate(&inputs));
        sink.event(ProgressEvent {
            message: format!("phase=Validate; {} issue(s)", report.issue_count()),
            elapsed: Some(started.elapsed()),
        });

        Ok(ValidateResult {
            data_dir: data_dir.to_string(),
            valid: report.is_empty(),
            issue_count: report.issue_count(),
            report,
        })
    }

    pub fn build(
        &self,
        data_dir: &Utf8Path,
        out_dir: &Utf8Path,
        config: &ResolvedConfig,
        options: BuildRunOptions,
        sink: &dyn ProgressSink,
    ) -> Result<BuildResult, CatalogError> {
        let started = Instant::now();
        sink.event(ProgressEvent {
            message: format!("phase=Load; reading tables from {data_dir}"),
            elapsed: None,
        });
        let (inputs, mut report) = DataDir::new(data_dir).load()?;
        report.merge(validate(&inputs));
        let issue_count = report.issue_count();
        if issue_count > 0 {
            if options.strict {
                return Err(CatalogError::ValidationFailed(issue_count));
            }
            for message in report.messages() {
                tracing::warn!("{message}");
            }
        }

        sink.event(ProgressEvent {
            message: "phase=Assemble; grouping, building and linking".to_string(),
            elapsed: Some(started.elapsed()),
        });
        let assembled = assemble(&inputs, &config.build)?;

        sink.event(ProgressEvent {
            message: format!("phase=Write; writing catalog to {out_dir}"),
            elapsed: Some(started.elapsed()),
        });
        let write_options = WriteOptions {
            root_href: config.root_href.clone(),
            pretty_print: config.pretty_print,
        };
        let written = write_catalog(
            &assembled.catalog,
            &assembled.metrics,
            out_dir,
            &write_options,
            &self.times,
        )?;
        let images = if config.copy_images {
            copy_images(data_dir, out_dir)?
        } else {
            0
        };

        sink.event(ProgressEvent {
            message: format!("phase=Done; {} documents", written.documents),
            elapsed: Some(started.elapsed()),
        });
        Ok(BuildResult {
            data_dir: data_dir.to_string(),
            out_dir: written.out_dir,
            containers: assembled.catalog.len(),
            documents: written.documents,
            relations: assembled.links.relations,
            attachments: assembled.links.attachments,
            images,
            issue_count,
            summary: assembled.metrics.summary,
        })
    }
}
