use std::io::Write;

use openmol::{BuildReport, Molecule};

use crate::util::text::{grouped, truncate};

const INDENT: &str = "      ";

const BOX_INNER_WIDTH: usize = 62;
const SAFE_TABLE_WIDTH: usize = BOX_INNER_WIDTH - INDENT.len();

pub fn print_record_summary(out: &mut impl Write, mol: &Molecule) {
    let mut rows = vec![
        (
            "Title",
            mol.title.clone().filter(|t| !t.is_empty()).unwrap_or_else(|| "-".to_string()),
        ),
        (
            "Source",
            mol.source_format.clone().unwrap_or_else(|| "-".to_string()),
        ),
        ("Atoms", grouped(mol.no_atoms)),
        ("Bonds", grouped(mol.no_bonds)),
        ("Angles", grouped(mol.no_angles)),
        ("Dihedrals", grouped(mol.no_diheds)),
        ("Impropers", grouped(mol.no_improper)),
        ("Residues", grouped(mol.no_residues)),
        ("Atom Types", grouped(mol.no_atom_types)),
    ];

    if mol.is_periodic() {
        rows.push((
            "Box (Å)",
            format!("{:.2} × {:.2} × {:.2}", mol.box_x, mol.box_y, mol.box_z),
        ));
        rows.push((
            "Angles (α β γ)",
            format!(
                "{:.1}° {:.1}° {:.1}°",
                mol.box_alpha, mol.box_beta, mol.box_gamma
            ),
        ));
    }
    if !mol.atom_q.is_empty() {
        let total: f64 = mol.atom_q.iter().sum();
        rows.push(("Net Charge", format!("{total:.4}")));
    }
    if mol.has_velocities() {
        rows.push(("Velocities", "yes".to_string()));
    }

    print_kv_table(out, "Record Summary", &rows);
}

/// Atom counts per unique type, most frequent first.
pub fn print_type_table(out: &mut impl Write, mol: &Molecule) {
    let mut counts = vec![0usize; mol.unique_atom_types.len()];
    for &i in &mol.atom_type_index {
        if let Some(c) = counts.get_mut(i) {
            *c += 1;
        }
    }
    let mut rows: Vec<(&str, usize, Option<f64>)> = mol
        .unique_atom_types
        .iter()
        .zip(counts)
        .enumerate()
        .map(|(k, (name, count))| (name.as_str(), count, mol.unique_atom_mass.get(k).copied()))
        .collect();
    if rows.is_empty() {
        return;
    }
    rows.sort_by(|a, b| b.1.cmp(&a.1));

    let name_w = 10usize;
    let count_w = 8usize;
    let sep_overhead = 6;
    let mass_w = SAFE_TABLE_WIDTH.saturating_sub(name_w + count_w + sep_overhead);

    let rule = |l: char, m: char, r: char| {
        format!(
            "{INDENT}{l}{}{m}{}{m}{}{r}",
            "─".repeat(name_w + 2),
            "─".repeat(count_w + 2),
            "─".repeat(mass_w + 2)
        )
    };

    let _ = writeln!(out, "{INDENT}┌─ Atom Types ─┐");
    let _ = writeln!(out, "{}", rule('┌', '┬', '┐'));
    let _ = writeln!(
        out,
        "{INDENT}│ {:<name_w$} │ {:>count_w$} │ {:>mass_w$} │",
        "Type", "Atoms", "Mass"
    );
    let _ = writeln!(out, "{}", rule('├', '┼', '┤'));
    for (name, count, mass) in rows.iter().take(15) {
        let mass = mass.map_or_else(|| "-".to_string(), |m| format!("{m:.3}"));
        let _ = writeln!(
            out,
            "{INDENT}│ {:<name_w$} │ {:>count_w$} │ {:>mass_w$} │",
            truncate(name, name_w),
            grouped(*count),
            mass
        );
    }
    if rows.len() > 15 {
        let _ = writeln!(
            out,
            "{INDENT}│ {:<name_w$} │ {:>count_w$} │ {:>mass_w$} │",
            "...",
            "...",
            format!("({} more types)", rows.len() - 15)
        );
    }
    let _ = writeln!(out, "{}", rule('└', '┴', '┘'));
}

pub fn print_build_report(out: &mut impl Write, report: &BuildReport) {
    if report.is_empty() {
        return;
    }
    let _ = writeln!(out, "{INDENT}┌─ Build Warnings ({}) ─┐", report.len());
    for warning in &report.warnings {
        let _ = writeln!(out, "{INDENT}  ! {warning}");
    }
}

pub fn print_check_results(out: &mut impl Write, results: &[(&str, bool)]) {
    let rows: Vec<(&str, String)> = results
        .iter()
        .map(|&(name, ok)| (name, if ok { "pass" } else { "FAIL" }.to_string()))
        .collect();
    print_kv_table(out, "Consistency Checks", &rows);
}

fn print_kv_table(out: &mut impl Write, title: &str, rows: &[(&str, String)]) {
    let key_w = 16usize;
    let sep_overhead = 6;
    let val_w = SAFE_TABLE_WIDTH.saturating_sub(key_w + sep_overhead);

    let _ = writeln!(
        out,
        "{}┌─ {} ─┐",
        INDENT,
        truncate(title, SAFE_TABLE_WIDTH - 6)
    );
    let _ = writeln!(
        out,
        "{}┌{k_line}┬{v_line}┐",
        INDENT,
        k_line = "─".repeat(key_w + 2),
        v_line = "─".repeat(val_w + 2)
    );
    let _ = writeln!(
        out,
        "{}│ {:<key_w$} │ {:>val_w$} │",
        INDENT,
        "Metric",
        "Value",
    );
    let _ = writeln!(
        out,
        "{}├{k_line}┼{v_line}┤",
        INDENT,
        k_line = "─".repeat(key_w + 2),
        v_line = "─".repeat(val_w + 2)
    );

    for (key, val) in rows {
        let _ = writeln!(
            out,
            "{}│ {:<key_w$} │ {:>val_w$} │",
            INDENT,
            truncate(key, key_w),
            truncate(val, val_w),
        );
    }

    let _ = writeln!(
        out,
        "{}└{k_line}┴{v_line}┘",
        INDENT,
        k_line = "─".repeat(key_w + 2),
        v_line = "─".repeat(val_w + 2)
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed() -> Molecule {
        let mut mol = Molecule::new();
        mol.title = Some("water".to_string());
        mol.no_atoms = 3;
        mol.unique_atom_types = vec!["OW".into(), "HW".into()];
        mol.unique_atom_mass = vec![15.999, 1.008];
        mol.atom_type_index = vec![0, 1, 1];
        mol.atom_q = vec![-0.8, 0.4, 0.4];
        mol
    }

    fn rendered(f: impl Fn(&mut Vec<u8>)) -> String {
        let mut out = Vec::new();
        f(&mut out);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn summary_lists_counts_and_charge() {
        let text = rendered(|out| print_record_summary(out, &typed()));
        assert!(text.contains("Record Summary"));
        assert!(text.contains("water"));
        assert!(text.contains("Net Charge"));
        assert!(!text.contains("Box"));
    }

    #[test]
    fn type_table_orders_by_count() {
        let text = rendered(|out| print_type_table(out, &typed()));
        let hw = text.find("HW").unwrap();
        let ow = text.find("OW").unwrap();
        assert!(hw < ow, "{text}");
        assert!(text.contains("15.999"));
    }

    #[test]
    fn empty_report_prints_nothing() {
        let text = rendered(|out| print_build_report(out, &BuildReport::new()));
        assert!(text.is_empty());
    }

    #[test]
    fn failed_checks_are_marked() {
        let text = rendered(|out| print_check_results(out, &[("atoms", true), ("bonds", false)]));
        assert!(text.contains("pass"));
        assert!(text.contains("FAIL"));
    }
}
