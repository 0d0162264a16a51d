// src/pipeline/hub.rs

//! UCSC track hub parameters and text rendering.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;

use crate::config::model::ConfigFile;
use crate::pipeline::layout::PathLayout;
use crate::types::Assay;

/// Overlay keys forced for RNA projects.
pub const RNA_OVERLAY_BY: [&str; 3] = ["samplename", "method", "strand"];

/// Subgroup keys forced for RNA projects.
pub const RNA_SUBGROUP_BY: [&str; 2] = ["method", "strand"];

/// Grouping key used when nothing else is configured.
const DEFAULT_GROUP_KEY: &str = "samplename";

/// Colours assigned to `color_by` groups in order of first appearance.
const PALETTE: [&str; 8] = [
    "31,119,180",
    "255,127,14",
    "44,160,44",
    "214,39,40",
    "148,103,189",
    "140,86,75",
    "227,119,194",
    "127,127,127",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubParams {
    pub name: String,
    pub short_label: String,
    pub long_label: String,
    pub email: String,
    pub genome: String,
    pub directory: PathBuf,
    pub color_by: Vec<String>,
    pub overlay_by: Vec<String>,
    pub subgroup_by: Vec<String>,
}

/// Assemble hub parameters from the configuration.
///
/// Grouping defaults to the sample name alone. RNA projects always group by
/// sample, method and strand, whatever the configuration says.
pub fn hub_params(cfg: &ConfigFile) -> HubParams {
    let hub = &cfg.hub;
    let name = hub
        .name
        .clone()
        .unwrap_or_else(|| cfg.project.name.clone());
    let default_group = || vec![DEFAULT_GROUP_KEY.to_string()];

    let (overlay_by, subgroup_by) = if cfg.assay() == Assay::RNA {
        (
            RNA_OVERLAY_BY.iter().map(|s| s.to_string()).collect(),
            RNA_SUBGROUP_BY.iter().map(|s| s.to_string()).collect(),
        )
    } else {
        (
            hub.overlay_by.clone().unwrap_or_else(default_group),
            hub.subgroup_by.clone().unwrap_or_else(default_group),
        )
    };

    HubParams {
        short_label: hub.short_label.clone().unwrap_or_else(|| name.clone()),
        long_label: hub.long_label.clone().unwrap_or_else(|| name.clone()),
        name,
        email: hub.email.clone().unwrap_or_default(),
        genome: cfg.genome.name.clone(),
        directory: hub
            .directory
            .clone()
            .unwrap_or_else(|| PathLayout::new(&cfg.project.output_dir).default_hub_dir()),
        color_by: hub.color_by.clone(),
        overlay_by,
        subgroup_by,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    BigWig,
    BigBed,
}

impl TrackKind {
    fn ucsc_type(&self) -> &'static str {
        match self {
            TrackKind::BigWig => "bigWig",
            TrackKind::BigBed => "bigBed",
        }
    }
}

/// One data file shown in the hub, with metadata for grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubTrack {
    pub name: String,
    pub source: PathBuf,
    pub kind: TrackKind,
    /// Keys like `samplename`, `ip`, `method`, `strand`.
    pub metadata: BTreeMap<String, String>,
}

impl HubTrack {
    /// File name the track gets inside `<hub>/<genome>/`.
    pub fn file_name(&self) -> String {
        let ext = self.kind.ucsc_type();
        format!("{}.{ext}", self.name)
    }

    fn group_key(&self, keys: &[String]) -> String {
        keys.iter()
            .map(|k| self.metadata.get(k).map(String::as_str).unwrap_or("NA"))
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// Text of the three hub descriptor files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubFiles {
    pub hub_txt: String,
    pub genomes_txt: String,
    pub trackdb_txt: String,
}

impl HubFiles {
    /// Relative locations inside the hub directory.
    pub fn paths(params: &HubParams) -> [PathBuf; 3] {
        [
            params.directory.join(format!("{}.hub.txt", params.name)),
            params.directory.join(format!("{}.genomes.txt", params.name)),
            params.directory.join(&params.genome).join("trackDb.txt"),
        ]
    }
}

/// Render hub descriptors for `tracks`.
///
/// Tracks are ordered by their `overlay_by` group, coloured by their
/// `color_by` group and tagged with their `subgroup_by` values.
pub fn render_hub(params: &HubParams, tracks: &[HubTrack]) -> HubFiles {
    let hub_txt = format!(
        "hub {}\nshortLabel {}\nlongLabel {}\ngenomesFile {}.genomes.txt\nemail {}\n",
        params.name, params.short_label, params.long_label, params.name, params.email
    );

    let genomes_txt = format!(
        "genome {}\ntrackDb {}/trackDb.txt\n",
        params.genome, params.genome
    );

    let mut ordered: Vec<&HubTrack> = tracks.iter().collect();
    ordered.sort_by(|a, b| {
        a.group_key(&params.overlay_by)
            .cmp(&b.group_key(&params.overlay_by))
            .then_with(|| a.name.cmp(&b.name))
    });

    let mut colours: BTreeMap<String, &str> = BTreeMap::new();
    let mut trackdb_txt = String::new();
    for track in ordered {
        let colour_group = track.group_key(&params.color_by);
        let next = PALETTE[colours.len() % PALETTE.len()];
        let colour = *colours.entry(colour_group).or_insert(next);

        let _ = writeln!(trackdb_txt, "track {}", track.name);
        let _ = writeln!(trackdb_txt, "bigDataUrl {}", track.file_name());
        let _ = writeln!(trackdb_txt, "shortLabel {}", track.name);
        let _ = writeln!(trackdb_txt, "longLabel {}", track.name);
        let _ = writeln!(trackdb_txt, "type {}", track.kind.ucsc_type());
        let _ = writeln!(trackdb_txt, "color {colour}");
        match track.kind {
            TrackKind::BigWig => {
                let _ = writeln!(trackdb_txt, "visibility full");
                let _ = writeln!(trackdb_txt, "autoScale on");
            }
            TrackKind::BigBed => {
                let _ = writeln!(trackdb_txt, "visibility dense");
            }
        }
        let subgroups: Vec<String> = params
            .subgroup_by
            .iter()
            .filter_map(|k| track.metadata.get(k).map(|v| format!("{k}={v}")))
            .collect();
        if !subgroups.is_empty() {
            let _ = writeln!(trackdb_txt, "subGroups {}", subgroups.join(" "));
        }
        trackdb_txt.push('\n');
    }

    HubFiles {
        hub_txt,
        genomes_txt,
        trackdb_txt,
    }
}
