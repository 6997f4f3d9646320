//! Compositor: drives one run from baseline capture to close

use stylecast_ast::Block;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::options::ComposeOptions;
use crate::report::WriteResult;
use crate::resolver::{ResolvedStyles, StyleInventory};
use crate::surface::DocumentSurface;
use crate::validation::{Findings, Phase, PollutionReport, RunState, Severity, StyleCheck};
use crate::writer::{BatchedWriter, StyleCache};

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeOutcome {
    /// Counters and style findings
    pub write_result: WriteResult,
    /// False when strict mode found a degradation
    pub success: bool,
    /// Aggregated strict-mode failure reason
    pub failure: Option<String>,
    /// Style names captured right after opening
    pub baseline_styles: Vec<String>,
    /// Resolved styles used for the run
    pub styles: ResolvedStyles,
}

/// Replays a block stream into a document surface
#[derive(Debug, Clone, Default)]
pub struct Compositor {
    options: ComposeOptions,
}

impl Compositor {
    pub fn new(options: ComposeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ComposeOptions {
        &self.options
    }

    /// Write `blocks` into `surface`, then save and close it
    ///
    /// Degradations never produce `Err`; they are reported in the outcome
    /// and fail it only in strict mode. The surface is saved and closed in
    /// both cases. On a hard error the surface is closed without saving.
    pub fn compose<S, I>(&self, surface: &mut S, blocks: I) -> Result<ComposeOutcome>
    where
        S: DocumentSurface,
        I: IntoIterator<Item = Block>,
    {
        let mut state = RunState::new();
        match self.run(surface, blocks, &mut state) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                if state.phase() != Phase::Closed {
                    if let Err(close_err) = surface.close() {
                        warn!("Closing document after error failed: {}", close_err);
                    }
                }
                Err(e)
            }
        }
    }

    fn run<S, I>(&self, surface: &mut S, blocks: I, state: &mut RunState) -> Result<ComposeOutcome>
    where
        S: DocumentSurface,
        I: IntoIterator<Item = Block>,
    {
        let baseline = surface.paragraph_style_names()?;
        let inventory = StyleInventory::new(baseline.iter().cloned());
        let styles = ResolvedStyles::resolve(&inventory);
        info!(
            "Template: {} paragraph styles, headings up to level {}",
            baseline.len(),
            styles.map.max_heading_level
        );
        debug!("Resolved styles: {:?}", styles);
        let cache = StyleCache::prime(surface, &baseline);

        state.advance(Phase::Writing)?;
        let mut writer = BatchedWriter::new(surface, &styles, cache, &self.options);
        let mut list_blocks = 0;
        for block in blocks {
            if matches!(block, Block::List { .. }) {
                list_blocks += 1;
            }
            writer.process_block(block)?;
        }
        let tally = writer.finish()?;

        state.advance(Phase::StyleCheck)?;
        let final_styles = surface.paragraph_style_names()?;
        let pollution = PollutionReport::compute(&baseline, &final_styles, &tally.styles_used);
        let list_style_used = [&styles.lists.bullet, &styles.lists.numbered]
            .into_iter()
            .flatten()
            .any(|s| tally.styles_used.contains(s));

        let validation = StyleCheck::new(self.options.strict).validate(&Findings {
            pollution: &pollution,
            table_fallback_count: tally.table_fallback_count,
            list_blocks,
            list_style_used,
            paragraph_errors: tally.paragraph_errors,
        });
        let failure = validation.failure_reason();
        state.advance(if failure.is_some() {
            Phase::StrictFail
        } else {
            Phase::Pass
        })?;

        surface.save()?;
        surface.close()?;
        state.advance(Phase::Closed)?;

        let mut warnings = tally.warnings;
        for message in validation.messages(Severity::Warning) {
            warn!("{}", message);
            warnings.push(message);
        }
        if let Some(reason) = &failure {
            warn!("{}", reason);
        }

        Ok(ComposeOutcome {
            write_result: WriteResult {
                headings_written: tally.headings_written,
                paragraphs_written: tally.paragraphs_written,
                lists_written: tally.lists_written,
                tables_written: tally.tables_written,
                table_fallback_count: tally.table_fallback_count,
                paragraph_errors: tally.paragraph_errors,
                warnings,
                styles_used: tally.styles_used.into_iter().collect(),
                polluting_styles: pollution.polluting_styles,
                unused_baseline_styles: pollution.unused_baseline_styles,
                list_style_used,
            },
            success: failure.is_none(),
            failure,
            baseline_styles: baseline,
            styles,
        })
    }
}
