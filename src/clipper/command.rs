//! Clips command execution.

use tracing::{info, warn};

use crate::Error;
use crate::cli::{ClipsArgs, GlobalArgs};
use crate::config::{Config, validate_extraction};
use crate::dataset::Recording;
use crate::output::create_writer;

use super::ClipExtractor;

/// Execute the clips command.
///
/// # Errors
///
/// Returns an error if the dataset cannot be opened, the clip settings are
/// invalid, or extraction or output fails.
pub fn execute(args: &ClipsArgs, config: &Config, global: &GlobalArgs) -> Result<(), Error> {
    let mut extraction = config.extraction.clone();
    if let Some(clip_len) = args.clip_len {
        extraction.clip_len = clip_len;
        // A file offset sized for another clip length no longer applies.
        extraction.centering_offset = None;
    }
    if let Some(offset) = args.centering_offset {
        extraction.centering_offset = Some(offset);
    }
    validate_extraction(&extraction)?;

    let parallel = global.parallel || config.reader.parallel;
    let recording =
        Recording::open(&args.dataset.dataset, args.dataset.backend)?.with_parallel(parallel);

    let times = match (&args.times, args.unit) {
        (Some(times), _) => times.clone(),
        (None, Some(unit)) => {
            let firings = recording.load_firings()?;
            let times = firings.unit_spike_train(unit, None, None);
            if times.is_empty() {
                warn!("Unit {unit} has no events in firings.mda");
            }
            times
        }
        // clap requires one of --times / --unit
        (None, None) => {
            return Err(Error::Internal {
                message: "either --times or --unit is required".to_string(),
            });
        }
    };

    let extractor = ClipExtractor::from_config(&extraction)?.with_parallel(parallel);
    let clips = extractor.extract(&recording, &times, args.channels.as_deref())?;

    let format = args.format.unwrap_or(config.output.format);
    let mut writer = create_writer(format, args.output.as_deref())?;
    writer.write_clips(&clips)?;
    writer.finalize()?;

    let (channels, clip_len, count) = clips.shape();
    info!(
        "Extracted {count} clips of {clip_len} samples on {channels} channels (center offset {})",
        clips.centering_offset()
    );
    if let Some(path) = &args.output {
        info!("Wrote {format} output to {}", path.display());
    }

    Ok(())
}
