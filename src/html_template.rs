use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::constants::{
    DEFAULT_MAP_CENTER, DEFAULT_MAP_ZOOM, GOOGLE_MAPS_URL_TEMPLATE, REGIONAL_MAP_ZOOM,
};
use crate::processing::PhotoRecord;

/// One marker as embedded into the generated document. The popup markup is
/// prepared here, with every file-derived string already escaped.
#[derive(Debug, Serialize)]
struct Marker {
    lat: f64,
    lon: f64,
    tooltip: String,
    popup: String,
}

#[derive(Debug, Serialize)]
struct MapData {
    center: [f64; 2],
    zoom: u8,
    markers: Vec<Marker>,
}

/// Renders the self-contained map document for an ordered list of records.
///
/// Deterministic: the same record list always yields the same document.
pub fn render_map(records: &[PhotoRecord]) -> Result<String> {
    let (center, zoom) = map_view(records);
    info!(
        "Rendering map centered at [{}, {}], zoom {}, {} markers",
        center[0],
        center[1],
        zoom,
        records.len()
    );

    let data = MapData {
        center,
        zoom,
        markers: records.iter().map(marker_for).collect(),
    };
    let json = serde_json::to_string(&data)
        .context("Failed to serialize marker data")?
        // An embedded "</..." must not terminate the inline script block
        .replace("</", "<\\/");

    Ok(MAP_HTML.replace("/*__MAP_DATA__*/null", &json))
}

/// Renders the map and writes it to `output_file`, creating parent
/// directories as needed.
pub fn build_map(records: &[PhotoRecord], output_file: &Path) -> Result<()> {
    let html = render_map(records)?;

    if let Some(parent) = output_file.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create output directory {}", parent.display())
        })?;
    }
    std::fs::write(output_file, html)
        .with_context(|| format!("Failed to write map to {}", output_file.display()))?;

    info!("Map saved to {}", output_file.display());
    Ok(())
}

/// Center on the mean coordinate at a regional zoom; with no records the map
/// falls back to a whole-world view.
fn map_view(records: &[PhotoRecord]) -> ([f64; 2], u8) {
    if records.is_empty() {
        return ([DEFAULT_MAP_CENTER.0, DEFAULT_MAP_CENTER.1], DEFAULT_MAP_ZOOM);
    }
    let count = records.len() as f64;
    let avg_lat = records.iter().map(|r| r.latitude).sum::<f64>() / count;
    let avg_lon = records.iter().map(|r| r.longitude).sum::<f64>() / count;
    ([avg_lat, avg_lon], REGIONAL_MAP_ZOOM)
}

fn marker_for(record: &PhotoRecord) -> Marker {
    let datetime = escape_html(&record.datetime);
    let model = escape_html(&record.model);
    let thumbnail = escape_html(&record.thumbnail_rel_path);
    let original_path = escape_html(&record.original_path);
    let maps_link = GOOGLE_MAPS_URL_TEMPLATE
        .replace("{lat}", &record.latitude.to_string())
        .replace("{lon}", &record.longitude.to_string());

    let popup = format!(
        "<b>Date:</b> {datetime}<br>\
         <b>Model:</b> {model}<br>\
         <a href=\"{maps_link}\" target=\"_blank\">Open in Google Maps</a><br>\
         <hr>\
         <img src=\"{thumbnail}\" alt=\"Thumbnail\" style=\"max-width:180px;\"><br>\
         <small><i>Path: {original_path}</i></small>"
    );

    Marker {
        lat: record.latitude,
        lon: record.longitude,
        tooltip: format!("Date: {}", record.datetime),
        popup,
    }
}

/// Escapes a file-derived string for embedding in HTML markup.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

// The document template is owned here; the single insertion point below is
// replaced with the serialized {center, zoom, markers} payload.
const MAP_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>PinMap</title>
    <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
    <link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@1.5.3/dist/MarkerCluster.css" />
    <link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@1.5.3/dist/MarkerCluster.Default.css" />
    <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/leaflet-measure@2.1.7/dist/leaflet-measure.css" />
    <style>
        body { margin: 0; padding: 0; font-family: Arial, sans-serif; }
        #app { display: flex; height: 100vh; }
        #map { flex: 1; height: 100%; }
        #side-panel {
            width: 300px;
            height: 100vh;
            background: white;
            border-left: 2px solid #ccc;
            overflow-y: auto;
            display: flex;
            flex-direction: column;
        }
        #side-panel .tabs {
            display: flex;
            border-bottom: 1px solid #ccc;
        }
        #side-panel .tabs button {
            flex: 1;
            padding: 10px;
            border: none;
            background: #f0f0f0;
            cursor: pointer;
            font-weight: bold;
        }
        #side-panel .tabs button.active {
            background: white;
            border-bottom: 2px solid #4285f4;
        }
        #side-panel .pane { display: none; padding: 12px; }
        #side-panel .pane.active { display: block; }
        #notes-area { width: 95%; height: 300px; margin-top: 10px; }
        .photo-popup img {
            border-radius: 4px;
            box-shadow: 0 1px 3px rgba(0,0,0,0.3);
        }
    </style>
</head>
<body>
    <div id="app">
        <div id="map"></div>

        <div id="side-panel">
            <div class="tabs">
                <button id="tab-info" class="active" onclick="showPane('info')">Info</button>
                <button id="tab-notes" onclick="showPane('notes')">Notes</button>
            </div>

            <div id="pane-info" class="pane active">
                <h3>PinMap</h3>
                <p>This map displays geolocated images found in the input directory.</p>
                <ul>
                    <li>Click marker clusters to zoom in.</li>
                    <li>Click individual markers for details and thumbnails.</li>
                    <li>Use the measure tool (ruler icon) for distances and areas.</li>
                    <li>Use the notes tab to record observations.</li>
                </ul>
            </div>

            <div id="pane-notes" class="pane">
                <h3>Notes</h3>
                <p>Jot down findings, observations, or questions related to the map points.</p>
                <textarea id="notes-area" placeholder="Your notes here..."></textarea>
                <div>
                    <button onclick="saveNotes()">Save Notes</button>
                    <button onclick="clearNotes()">Clear Notes</button>
                </div>
                <p><small>Notes are saved in the browser's local storage.</small></p>
            </div>
        </div>
    </div>

    <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
    <script src="https://unpkg.com/leaflet.markercluster@1.5.3/dist/leaflet.markercluster.js"></script>
    <script src="https://cdn.jsdelivr.net/npm/leaflet-measure@2.1.7/dist/leaflet-measure.min.js"></script>
    <script>
        const MAP_DATA = /*__MAP_DATA__*/null;

        // Base layers and map
        const osm = L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
            attribution: '&copy; <a href="https://www.openstreetmap.org/copyright">OpenStreetMap</a> contributors'
        });
        const topo = L.tileLayer('https://{s}.tile.opentopomap.org/{z}/{x}/{y}.png', {
            attribution: '&copy; <a href="https://opentopomap.org">OpenTopoMap</a> contributors'
        });

        const map = L.map('map', { layers: [osm] }).setView(MAP_DATA.center, MAP_DATA.zoom);
        L.control.layers({ 'OpenStreetMap': osm, 'OpenTopoMap': topo }).addTo(map);

        // Measurement overlay
        new L.Control.Measure({
            position: 'topleft',
            primaryLengthUnit: 'meters',
            secondaryLengthUnit: 'kilometers',
            primaryAreaUnit: 'sqmeters'
        }).addTo(map);

        // Markers go into a cluster layer so dense groups collapse
        const markerClusterGroup = L.markerClusterGroup({
            maxClusterRadius: 80,
            spiderfyOnMaxZoom: true,
            showCoverageOnHover: true,
            zoomToBoundsOnClick: true
        });

        MAP_DATA.markers.forEach(m => {
            const marker = L.marker([m.lat, m.lon]);
            marker.bindTooltip(m.tooltip);
            marker.bindPopup('<div class="photo-popup">' + m.popup + '</div>', { maxWidth: 250 });
            markerClusterGroup.addLayer(marker);
        });
        map.addLayer(markerClusterGroup);

        // Side panel tabs
        function showPane(name) {
            for (const pane of ['info', 'notes']) {
                document.getElementById('pane-' + pane).classList.toggle('active', pane === name);
                document.getElementById('tab-' + pane).classList.toggle('active', pane === name);
            }
        }

        // Notes live in the viewer's browser only
        const NOTES_KEY = 'pinmapNotes';
        const notesArea = document.getElementById('notes-area');
        notesArea.value = localStorage.getItem(NOTES_KEY) || '';

        function saveNotes() {
            localStorage.setItem(NOTES_KEY, notesArea.value);
            alert('Notes saved!');
        }
        function clearNotes() {
            if (confirm('Are you sure you want to clear all saved notes?')) {
                notesArea.value = '';
                localStorage.removeItem(NOTES_KEY);
                alert('Notes cleared!');
            }
        }
    </script>
</body>
</html>"#;
