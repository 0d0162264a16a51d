// src/exec/actions.rs

//! In-process task actions.

use anyhow::{Result, bail};
use tracing::info;

use crate::fs::FileSystem;
use crate::pipeline::hub::{HubFiles, HubParams, HubTrack, render_hub};
use crate::pipeline::peaks::validate_peak_file;
use crate::pipeline::task::TaskAction;

/// Run a non-shell action against `fs`.
pub fn run_action(action: &TaskAction, fs: &dyn FileSystem) -> Result<()> {
    match action {
        TaskAction::Shell(_) => bail!("shell commands are not in-process actions"),
        TaskAction::WriteDesign { design, path } => {
            let csv = design.to_csv_string()?;
            fs.write(path, csv.as_bytes())?;
            info!(path = %path.display(), entries = design.len(), "design table written");
        }
        TaskAction::ValidatePeaks { files, sentinel } => {
            let mut patched = String::new();
            let mut count = 0usize;
            for file in files {
                if validate_peak_file(fs, file)? {
                    patched.push_str(&format!("{}\n", file.display()));
                    count += 1;
                }
            }
            // The sentinel lists the files that got a placeholder.
            fs.write(sentinel, patched.as_bytes())?;
            info!(checked = files.len(), patched = count, "peak files validated");
        }
        TaskAction::CopyFile { from, to } => {
            fs.copy(from, to)?;
        }
        TaskAction::WriteHub { params, tracks } => write_hub(fs, params, tracks)?,
    }
    Ok(())
}

/// Copy track files into `<hub>/<genome>/` and write the descriptors.
fn write_hub(fs: &dyn FileSystem, params: &HubParams, tracks: &[HubTrack]) -> Result<()> {
    let track_dir = params.directory.join(&params.genome);
    for track in tracks {
        fs.copy(&track.source, &track_dir.join(track.file_name()))?;
    }

    let files = render_hub(params, tracks);
    let [hub_txt, genomes_txt, trackdb_txt] = HubFiles::paths(params);
    fs.write(&hub_txt, files.hub_txt.as_bytes())?;
    fs.write(&genomes_txt, files.genomes_txt.as_bytes())?;
    fs.write(&trackdb_txt, files.trackdb_txt.as_bytes())?;

    info!(
        hub = %params.name,
        directory = %params.directory.display(),
        tracks = tracks.len(),
        "track hub written"
    );
    Ok(())
}
