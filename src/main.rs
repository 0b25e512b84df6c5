use std::io;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use canaug::{
    automorphism::{automorphisms, SymmetryMode},
    capacity::{parse_override, Capacities},
    enumerate::{AugmentMode, ElementMode, Generator, ParallelMode},
    handler::{CountingHandler, CsvHandler, DuplicateCountingHandler, Handler},
    loader::{parse_formula, parse_molecule_str},
    molecule::Molecule,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Molecular formula such as C4H10.
    formula: Option<String>,

    /// Report the symmetry of a molecule string such as "C0C1C2 0:1(1),1:2(1)"
    /// instead of enumerating.
    #[arg(long, conflicts_with = "formula")]
    symmetry: Option<String>,

    #[arg(long, value_enum, default_value_t = SymmetryMode::Atoms)]
    symmetry_mode: SymmetryMode,

    #[arg(short, long, value_enum, default_value_t = AugmentMode::Atom)]
    augment: AugmentMode,

    /// How atoms get their elements. `sequence` can miss structures when the
    /// formula has more than one heavy element.
    #[arg(short, long, value_enum, default_value_t = ElementMode::Multiset)]
    elements: ElementMode,

    #[arg(short, long, value_enum, default_value_t = ParallelMode::None)]
    parallel: ParallelMode,

    /// Override an element's capacity, e.g. N=3:3 for valence 3 and at most
    /// triple bonds. May be repeated.
    #[arg(short, long)]
    capacity: Vec<String>,

    /// Stop after this many molecules.
    #[arg(short, long)]
    limit: Option<usize>,

    /// Print every molecule as a CSV row of parent and child.
    #[arg(long)]
    print: bool,

    /// Check the output for isomorphic pairs.
    #[arg(long)]
    check_duplicates: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if let Some(s) = &cli.symmetry {
        let mol = parse_molecule_str(s).with_context(|| format!("Cannot parse {s:?}"))?;
        let aut = automorphisms(&mol, cli.symmetry_mode)?;
        println!("order: {}", aut.group().order());
        println!("canonical labeling: {}", aut.best_labeling());
        for g in aut.group().generators() {
            println!("generator: {g}");
        }
        if cli.symmetry_mode == SymmetryMode::Atoms {
            println!("canonical form: {}", mol.relabel(aut.best_labeling())?);
        }
        return Ok(());
    }

    let Some(formula) = &cli.formula else {
        bail!("Give a formula or --symmetry");
    };
    let formula = parse_formula(formula).with_context(|| format!("Cannot parse {formula:?}"))?;

    let mut capacities = Capacities::default();
    for s in &cli.capacity {
        let (element, capacity) = parse_override(s)?;
        capacities.insert(element, capacity)?;
    }

    let generator = Generator::for_formula(&formula, cli.augment, cli.elements, capacities)?
        .with_parallel(cli.parallel);

    let report = Report {
        counter: match cli.limit {
            Some(limit) => CountingHandler::with_limit(limit),
            None => CountingHandler::new(),
        },
        printer: cli.print.then(|| CsvHandler::new(io::stdout())),
        duplicates: cli.check_duplicates.then(DuplicateCountingHandler::new),
    };
    generator.run(&report)?;
    info!("Enumeration finished");

    if let Some(duplicates) = &report.duplicates {
        let repeated = duplicates.duplicates();
        for class in &repeated {
            eprintln!("duplicate class: {}", class.join(" | "));
        }
        if !repeated.is_empty() {
            bail!("{} isomorphism classes were reported more than once", repeated.len());
        }
    }
    println!("{}", report.counter.count());
    Ok(())
}

/// Counts, and optionally prints and checks, every reported molecule.
struct Report {
    counter: CountingHandler,
    printer: Option<CsvHandler<io::Stdout>>,
    duplicates: Option<DuplicateCountingHandler>,
}

impl Handler for Report {
    fn handle(&self, parent: &Molecule, child: &Molecule) {
        if !self.counter.try_claim() {
            return;
        }
        if let Some(printer) = &self.printer {
            printer.handle(parent, child);
        }
        if let Some(duplicates) = &self.duplicates {
            duplicates.handle(parent, child);
        }
    }

    fn finish(&self) {
        if let Some(printer) = &self.printer {
            printer.finish();
        }
    }

    fn is_done(&self) -> bool {
        self.counter.is_done()
    }
}
