//! Self-contained results page rendering each candidate with 3Dmol.js.

use crate::core::export::{format_property, structure_paths, table_row, StructurePaths, TABLE_HEADERS};
use crate::domain::model::{PredictionReport, RankedCandidate};
use std::fmt::Write as _;

pub const VIEWER_SCRIPT_URL: &str = "https://3Dmol.org/build/3Dmol-min.js";
pub const VIEWER_SIZE_PX: u32 = 500;

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

/// Keeps embedded data from closing the surrounding `<script>` element.
fn escape_script_data(text: &str) -> String {
    text.replace("</", "<\\/")
}

fn formula_list(formulas: &[String]) -> String {
    if formulas.is_empty() {
        return "<p class=\"muted\">(none)</p>".to_string();
    }
    let items: String = formulas
        .iter()
        .map(|f| format!("<li>{}</li>", escape_html(f)))
        .collect();
    format!("<ul>{}</ul>", items)
}

fn results_table(candidates: &[RankedCandidate]) -> String {
    let mut html = String::from("<table><thead><tr>");
    for header in TABLE_HEADERS {
        let _ = write!(html, "<th>{}</th>", escape_html(header));
    }
    html.push_str("</tr></thead><tbody>");
    for candidate in candidates {
        html.push_str("<tr>");
        for cell in table_row(candidate) {
            let _ = write!(html, "<td>{}</td>", escape_html(&cell));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

fn candidate_card(index: usize, candidate: &RankedCandidate, paths: &StructurePaths) -> String {
    let summary = &candidate.summary;
    let [na, nb, nc] = candidate.supercell;
    let mut html = String::new();
    let _ = write!(
        html,
        "<div class=\"card\"><div class=\"title\">🧬 {}</div>\
         <div class=\"meta\">MP ID: {} | E_f: {} eV/atom | Band Gap: {} eV | {}×{}×{} supercell</div>",
        escape_html(&summary.formula_pretty),
        escape_html(&summary.material_id),
        format_property(summary.formation_energy_per_atom),
        format_property(summary.band_gap),
        na,
        nb,
        nc
    );

    match &candidate.cif {
        Some(cif) => {
            let _ = write!(
                html,
                "<div id=\"viewer-{index}\" class=\"viewer\" style=\"width:{size}px;height:{size}px\"></div>\
                 <script type=\"text/plain\" id=\"cif-{index}\">{data}</script>",
                index = index,
                size = VIEWER_SIZE_PX,
                data = escape_script_data(cif)
            );
        }
        None => {
            let _ = write!(
                html,
                "<p class=\"error\">No structure available for {}</p>",
                escape_html(&summary.formula_pretty)
            );
        }
    }

    let mut downloads = Vec::new();
    if candidate.cif.is_some() {
        downloads.push(download_link(&paths.cif, "CIF"));
    }
    if candidate.poscar.is_some() {
        downloads.push(download_link(&paths.poscar, "POSCAR"));
    }
    if !downloads.is_empty() {
        let _ = write!(html, "<div class=\"downloads\">{}</div>", downloads.join(" "));
    }

    html.push_str("</div>");
    html
}

fn download_link(path: &str, label: &str) -> String {
    format!(
        "<a href=\"{}\" download>📥 Download {}</a>",
        escape_html(path),
        label
    )
}

const STYLE: &str = "body{font-family:sans-serif;background:#0e1117;color:#e6e6e6;margin:2em}\
h1,h2{color:#00c3ff}.columns{display:flex;gap:2em}.columns>div{flex:1}\
table{border-collapse:collapse}th,td{border:1px solid #23272f;padding:6px 10px}\
.cards{display:flex;flex-wrap:wrap;gap:1em}\
.card{background:#181c24;border-radius:12px;padding:10px;border:1px solid #23272f;text-align:center}\
.card .title{font-weight:700;color:#00c3ff;font-size:16px}.card .meta{font-size:12px;color:#b0b8c1;margin-bottom:8px}\
.viewer{position:relative;margin:auto}.downloads{margin-top:8px}.downloads a{color:#00c3ff;margin:0 6px}.muted{color:#7d858f}.warning{color:#f0b429}.error{color:#ff6b6b}";

const RENDER_SCRIPT: &str = "document.querySelectorAll('.viewer').forEach(function (el) {\
  var index = el.id.split('-')[1];\
  var data = document.getElementById('cif-' + index).textContent;\
  var viewer = $3Dmol.createViewer(el, {backgroundColor: 'white'});\
  viewer.addModel(data, 'cif');\
  viewer.setStyle({}, {stick: {radius: 0.15, colorscheme: 'Jmol'}, sphere: {scale: 0.3, colorscheme: 'Jmol'}});\
  viewer.zoomTo();\
  viewer.render();\
});";

pub fn render_page(report: &PredictionReport) -> String {
    let shortlist = &report.shortlist;
    let mut html = String::new();

    let _ = write!(
        html,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Materials Predictor</title>\
         <script src=\"{}\"></script><style>{}</style></head><body>",
        VIEWER_SCRIPT_URL, STYLE
    );
    let _ = write!(
        html,
        "<h1>🔬 Materials Predictor</h1><p>Design goal: <strong>{}</strong></p>\
         <p class=\"muted\">Generated {}</p>",
        escape_html(&shortlist.goal),
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    let _ = write!(
        html,
        "<h2>🤖 Suggested Formulas</h2><div class=\"columns\">\
         <div><h3>LLM A Suggestions ({})</h3>{}</div>\
         <div><h3>LLM B Suggestions ({})</h3>{}</div></div>",
        escape_html(&shortlist.primary_provider),
        formula_list(&shortlist.primary_suggestions),
        escape_html(&shortlist.secondary_provider),
        formula_list(&shortlist.secondary_suggestions)
    );

    html.push_str("<h2>✅ Selecting only High complying Materials</h2>");
    if shortlist.approved.is_empty() {
        html.push_str("<p class=\"warning\">No materials passed both evaluations.</p>");
    } else {
        html.push_str(&formula_list(&shortlist.approved));
    }

    if report.candidates.is_empty() {
        html.push_str("<p class=\"error\">No suitable material found.</p>");
    } else {
        let _ = write!(
            html,
            "<h2>🎯 Top {} Candidates Found</h2>{}\
             <p><a href=\"top_candidates.csv\" download>Download table CSV</a></p>\
             <h2>🔍 Structure Viewers</h2><div class=\"cards\">",
            report.candidates.len(),
            results_table(&report.candidates)
        );
        let paths = structure_paths(&report.candidates);
        for (index, (candidate, paths)) in report.candidates.iter().zip(&paths).enumerate() {
            html.push_str(&candidate_card(index, candidate, paths));
        }
        let _ = write!(html, "</div><script>{}</script>", RENDER_SCRIPT);
    }

    html.push_str("</body></html>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{MaterialSummary, Shortlist};

    fn report(candidates: Vec<RankedCandidate>, approved: Vec<String>) -> PredictionReport {
        PredictionReport {
            generated_at: chrono::Utc::now(),
            shortlist: Shortlist {
                goal: "<b>conductor</b>".to_string(),
                primary_provider: "OpenAI".to_string(),
                secondary_provider: "Gemini".to_string(),
                primary_suggestions: vec!["ZnO".to_string()],
                secondary_suggestions: vec![],
                approved,
                ..Default::default()
            },
            lookups: vec![],
            candidates,
        }
    }

    fn candidate(cif: Option<&str>) -> RankedCandidate {
        RankedCandidate {
            rank: 1,
            summary: MaterialSummary {
                material_id: "mp-2133".to_string(),
                formula_pretty: "ZnO".to_string(),
                formation_energy_per_atom: Some(-1.8),
                band_gap: Some(0.73),
                density: Some(5.6),
                structure: None,
            },
            supercell: [2, 2, 2],
            cif: cif.map(str::to_string),
            poscar: None,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<a href='x'>&\"</a>"),
            "&lt;a href=&#x27;x&#x27;&gt;&amp;&quot;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_page_escapes_goal_and_lists_suggestions() {
        let page = render_page(&report(vec![], vec![]));
        assert!(page.contains("&lt;b&gt;conductor&lt;/b&gt;"));
        assert!(!page.contains("<b>conductor</b>"));
        assert!(page.contains("<li>ZnO</li>"));
        assert!(page.contains("No materials passed both evaluations."));
        assert!(page.contains("No suitable material found."));
        assert!(!page.contains("$3Dmol.createViewer"));
    }

    #[test]
    fn test_page_embeds_viewer_per_candidate() {
        let page = render_page(&report(
            vec![candidate(Some("data_ZnO\n</script>"))],
            vec!["ZnO".to_string()],
        ));
        assert!(page.contains("id=\"viewer-0\""));
        assert!(page.contains("width:500px;height:500px"));
        assert!(page.contains("data_ZnO\n<\\/script>"));
        assert!(page.contains("MP ID: mp-2133 | E_f: -1.800 eV/atom | Band Gap: 0.730 eV"));
        assert!(page.contains("colorscheme: 'Jmol'"));
        assert!(page.contains("<td>5.600</td>"));
    }

    #[test]
    fn test_missing_structure_shows_error_card() {
        let page = render_page(&report(vec![candidate(None)], vec!["ZnO".to_string()]));
        assert!(page.contains("No structure available for ZnO"));
        assert!(!page.contains("id=\"viewer-0\""));
    }

    #[test]
    fn test_cards_link_structure_downloads() {
        let mut with_poscar = candidate(Some("data_ZnO"));
        with_poscar.poscar = Some("ZnO\n1.0\n".to_string());
        let page = render_page(&report(vec![with_poscar], vec!["ZnO".to_string()]));
        assert!(page.contains("<a href=\"structures/ZnO.cif\" download>📥 Download CIF</a>"));
        assert!(page.contains(
            "<a href=\"structures/ZnO_POSCAR.vasp\" download>📥 Download POSCAR</a>"
        ));

        let cif_only = render_page(&report(vec![candidate(Some("data_ZnO"))], vec![]));
        assert!(cif_only.contains("structures/ZnO.cif"));
        assert!(!cif_only.contains("POSCAR.vasp"));

        let missing = render_page(&report(vec![candidate(None)], vec![]));
        assert!(!missing.contains("class=\"downloads\""));
    }
}
