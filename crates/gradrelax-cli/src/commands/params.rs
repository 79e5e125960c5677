use crate::cli::ParamsArgs;
use crate::config::PartialConfig;
use crate::error::{CliError, Result};
use gradrelax::core::models::residue::ResidueType;
use gradrelax::core::params::positions::LabeledPositions;
use gradrelax::core::params::store::ParameterStore;
use std::fmt::Write;
use tracing::{debug, info};

pub fn run(args: ParamsArgs) -> Result<()> {
    let paths = PartialConfig::load(args.config.as_deref())?.parameter_paths(&args)?;
    debug!("Resolved parameter paths: {:?}", paths);

    info!("Loading parameter tables...");
    let store = ParameterStore::load(&paths)?;

    print!("{}", summary(&store));
    if let Some(residue) = args.residue.as_deref() {
        print!("{}", residue_report(&store, residue, args.atom.as_deref())?);
    }
    Ok(())
}

fn summary(store: &ParameterStore) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Parameter tables loaded:");
    let _ = writeln!(out, "  hydrogen positions:     {}", store.hydrogens.len());
    let _ = writeln!(out, "  free-orbital positions: {}", store.free_orbitals.len());
    let _ = writeln!(out, "  hbond property rows:    {}", store.hbond.len());
    let _ = writeln!(out, "  bonded partner entries: {}", store.partners.len());
    if store.diagnostics.is_clean() {
        let _ = writeln!(out, "  all property tokens parsed as typed values");
    } else {
        let _ = writeln!(
            out,
            "  {} property token(s) kept as text:",
            store.diagnostics.fallback_count()
        );
        for fallback in &store.diagnostics.fallbacks {
            let _ = writeln!(
                out,
                "    line {}, column '{}': '{}'",
                fallback.line, fallback.column, fallback.value
            );
        }
    }
    out
}

/// Renders every entry of one residue, optionally restricted to one atom.
fn residue_report(store: &ParameterStore, residue: &str, atom: Option<&str>) -> Result<String> {
    let code = residue.trim().to_ascii_uppercase();
    let standard = code.parse::<ResidueType>().ok();

    let known = store.hydrogens.contains_residue(&code)
        || store.free_orbitals.contains_residue(&code)
        || store.hbond.residue(&code).is_some()
        || standard.is_some_and(|r| store.partners.residue(r).is_some());
    if !known {
        return Err(CliError::UnknownResidue(code));
    }

    let keep = |name: &str| atom.is_none_or(|a| a == name);
    let mut out = String::new();
    let _ = writeln!(out, "\n[{}]", code);

    write_positions(&mut out, "hydrogens", &store.hydrogens, &code, &keep);
    write_positions(&mut out, "free orbitals", &store.free_orbitals, &code, &keep);

    if let Some(rows) = store.hbond.residue(&code) {
        let _ = writeln!(out, "  properties:");
        let mut atoms: Vec<_> = rows.iter().filter(|(name, _)| keep(name.as_str())).collect();
        atoms.sort_by(|a, b| a.0.cmp(b.0));
        for (name, props) in atoms {
            let mut columns: Vec<_> = props.columns().collect();
            columns.sort_by(|a, b| a.0.cmp(b.0));
            let rendered: Vec<String> = columns
                .iter()
                .map(|(column, value)| format!("{}={:?}", column, value))
                .collect();
            let _ = writeln!(out, "    {:<5} {}", name, rendered.join(" "));
        }
    }

    if let Some(partners) = standard.and_then(|r| store.partners.residue(r)) {
        let _ = writeln!(out, "  partners:");
        let mut atoms: Vec<_> = partners.iter().filter(|(name, _)| keep(name.as_str())).collect();
        atoms.sort_by(|a, b| a.0.cmp(b.0));
        for (name, [first, second]) in atoms {
            let _ = writeln!(out, "    {:<5} {} {}", name, first, second);
        }
    }
    Ok(out)
}

fn write_positions(
    out: &mut String,
    title: &str,
    table: &LabeledPositions,
    residue: &str,
    keep: &dyn Fn(&str) -> bool,
) {
    let Some(atoms) = table.residue(residue) else {
        return;
    };
    let _ = writeln!(out, "  {}:", title);
    let mut names: Vec<_> = atoms.keys().filter(|name| keep(name.as_str())).collect();
    names.sort();
    for name in names {
        for (label, offset) in &atoms[name] {
            let _ = writeln!(
                out,
                "    {:<5} {:<6} {:>8.3} {:>8.3} {:>8.3}",
                name, label, offset.x, offset.y, offset.z
            );
        }
    }
}
