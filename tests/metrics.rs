use kira_module_matrix::kegg::parse_module_list;
use kira_module_matrix::matrix::{CountMatrix, ModuleCount};
use kira_module_matrix::metrics::{QualityReport, matrix_sparsity, percent_unmapped};

fn count(sample: &str, module: &str, n: u64) -> ModuleCount {
    ModuleCount {
        sample_id: sample.parse().unwrap(),
        kegg_module: module.to_string(),
        n_proteins: n,
    }
}

#[test]
fn pivot_round_trips_long_counts() {
    let long = vec![
        count("ERR1", "M00001", 4),
        count("ERR1", "M00003", 1),
        count("ERR2", "M00002", 7),
        count("ERR3", "M00001", 2),
    ];
    let matrix = CountMatrix::from_long(&long);
    for c in &long {
        assert_eq!(matrix.get(&c.sample_id, &c.kegg_module), Some(c.n_proteins));
    }

    let mut nonzero = 0;
    for sample in matrix.sample_ids() {
        for module in matrix.module_ids() {
            let in_long = long
                .iter()
                .any(|c| &c.sample_id == sample && &c.kegg_module == module);
            let value = matrix.get(sample, module).unwrap();
            if in_long {
                nonzero += 1;
            } else {
                assert_eq!(value, 0);
            }
        }
    }
    assert_eq!(nonzero, long.len());
    assert_eq!(matrix_sparsity(&matrix), 55.56);
}

#[test]
fn unmapped_against_parsed_reference() {
    let reference =
        parse_module_list("module:M00001\tGlycolysis, core\nmodule:M00002\tTCA cycle\n").unwrap();
    let observed = ["M00001", "M00002", "M99999", "M99998"];
    assert_eq!(percent_unmapped(observed, &reference), 50.0);
    assert_eq!(percent_unmapped(["M00001"], &reference), 0.0);
    assert_eq!(percent_unmapped(["M99999"], &reference), 100.0);
    assert_eq!(percent_unmapped(std::iter::empty::<&str>(), &reference), 0.0);

    let matrix = CountMatrix::from_long(&[count("ERR1", "M00001", 1), count("ERR1", "M99999", 1)]);
    let report = QualityReport::build(&matrix, Some(&reference));
    assert_eq!(report.percent_unmapped, Some(50.0));
    assert_eq!(report.unmapped_modules, vec!["M99999".to_string()]);
    assert_eq!(report.sparsity, 0.0);
}
