use std::fs;
use std::path::Path;
use std::sync::Arc;

use hazmap::io::{
    load_gazetteer, load_layers, load_roster, read_resolved, write_incomplete, write_resolved,
};
use hazmap::{
    classify, expand, Config, Gazetteer, GazetteerRow, Hierarchy, Individual, Matcher,
    MembershipSet, Normalizer, ResolvedIndividual, Resolver, SelectionEntry, Share,
};

const GAZETTEER: &str = "\
GID_0,GID_1,NAME_1,GID_2,NAME_2,GID_3,NAME_3
PHL,P1,Cavite,C1,Kawit,B1,Binakayan
PHL,P1,Cavite,C1,Kawit,B2,Tabon I
PHL,P1,Cavite,C2,Imus,B3,Poblacion I-A
PHL,P2,Laguna,C3,Santa Rosa,B4,Balibago
PHL,P2,Laguna,C3,Santa Rosa,B5,n.a.
";

const ROSTER: &str = "\
student_number,strand,grade_level,province,city_municipality,barangay
1001,STEM,11,Cavite,Kawit,Binakayan
1002,STEM,12,cavite,Kawit,Tabon 1
1003,ABM,11,CAVITE,City of Imus,Pob. I-A
1004,ABM,12,Laguna,Sta. Rosa City,Brgy. Balibago
1005,HUMSS,11,Laguna,Santa Rosa,
";

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn resolver_for(gazetteer: Gazetteer) -> Resolver {
    let normalizer = Normalizer::new(gazetteer.hierarchy().clone());
    let matcher = Matcher::new(Arc::new(gazetteer), &normalizer).unwrap();
    Resolver::new(normalizer, matcher).unwrap()
}

#[test]
fn test_full_pipeline_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::default();

    let gazetteer = load_gazetteer(&write(dir.path(), "gadm.csv", GAZETTEER), &config).unwrap();
    assert_eq!(gazetteer.len(), 4);
    let roster = load_roster(&write(dir.path(), "roster.csv", ROSTER), &config).unwrap();

    let normalizer = config.normalizer(None).unwrap();
    let matcher = Matcher::new(Arc::new(gazetteer.clone()), &normalizer).unwrap();
    let mut resolver = Resolver::new(normalizer, matcher).unwrap();
    let resolution = resolver.resolve(&roster.individuals).unwrap();

    let codes: Vec<Option<&str>> = resolution
        .resolved
        .iter()
        .map(|r| r.resolved_code.as_deref())
        .collect();
    assert_eq!(
        codes,
        vec![Some("B1"), Some("B2"), Some("B3"), Some("B4"), None]
    );
    assert_eq!(resolution.incomplete.len(), 1);
    assert_eq!(resolution.incomplete[0].id, "1005");
    assert_eq!(resolution.incomplete[0].missing_data(), "barangay");
    assert_eq!(resolution.resolved[0].match_score, Some(3.0));

    // Round-trip through the resolved export, then report on a mixed-level selection
    let mut resolved_csv = Vec::new();
    write_resolved(&mut resolved_csv, &roster, &resolution.resolved, &gazetteer, false).unwrap();
    let table = read_resolved(resolved_csv.as_slice()).unwrap();
    assert_eq!(table.records.len(), 5);

    let layer = write(
        dir.path(),
        "flood.csv",
        "level,category,name,gid\n2,city or municipality,Kawit,C1\n3,barangay,Balibago,B4\n",
    );
    let selection = load_layers(&[layer]).unwrap();
    let expansion = expand(selection.entries(), &gazetteer);
    assert_eq!(expansion.members.sorted(), vec!["B1", "B2", "B4"]);

    let classification = classify(&table.records, &expansion.members);
    assert_eq!(classification.total(), 4);
    assert_eq!(classification.affected_count(), 3);
    assert_eq!(classification.unresolved_count(), 1);
    assert_eq!(classification.share(), Share::Percent(75.0));

    let strands = classification.by_group_expecting("strand", &["STEM", "ABM", "HUMSS", "GA"]);
    let shares: Vec<(&str, Share)> = strands.iter().map(|s| (s.value.as_str(), s.share)).collect();
    assert_eq!(
        shares,
        vec![
            ("STEM", Share::Percent(100.0)),
            ("ABM", Share::Percent(50.0)),
            ("HUMSS", Share::NotApplicable),
            ("GA", Share::NotApplicable),
        ]
    );

    let mut incomplete_csv = Vec::new();
    write_incomplete(&mut incomplete_csv, &resolution.incomplete).unwrap();
    assert_eq!(
        String::from_utf8(incomplete_csv).unwrap(),
        "id,missing_data\n1005,barangay\n"
    );
}

#[test]
fn test_scenario_perfect_match_after_normalization() {
    let gazetteer = Gazetteer::new(
        Hierarchy::default(),
        vec![GazetteerRow::new(["P1", "C1", "B1"], ["province_a", "city_b", "brgy_c"])],
    )
    .unwrap();
    let mut resolver = resolver_for(gazetteer);

    let normalized = resolver
        .normalizer()
        .normalize_address(&["Province A", "City B City", "Brgy. C"])
        .unwrap();
    assert_eq!(normalized, vec!["province a", "city b", "c"]);

    let individual = Individual::new("1", [Some("Province A"), Some("City B City"), Some("Brgy. C")]);
    let resolution = resolver.resolve(&[individual]).unwrap();
    let record = &resolution.resolved[0];
    assert_eq!(record.resolved_code.as_deref(), Some("B1"));
    assert_eq!(record.match_score, Some(3.0));
    assert_eq!(resolution.perfect_count(), 1);
}

#[test]
fn test_scenario_coarse_selection_expands_to_descendants() {
    let gazetteer = Gazetteer::new(
        Hierarchy::default(),
        vec![
            GazetteerRow::new(["P1", "C1", "B1"], ["a", "b", "c"]),
            GazetteerRow::new(["P1", "C1", "B2"], ["a", "b", "d"]),
            GazetteerRow::new(["P1", "C2", "B3"], ["a", "e", "f"]),
            GazetteerRow::new(["P2", "C3", "B4"], ["g", "h", "i"]),
        ],
    )
    .unwrap();

    let expansion = expand(&[SelectionEntry::new(1, "P1", "province", "a")], &gazetteer);
    let expected: MembershipSet = ["B1", "B2", "B3"].into_iter().collect();
    assert_eq!(expansion.members, expected);
    assert!(expansion.skipped.is_empty());
}

#[test]
fn test_scenario_classification_share() {
    let resolved: Vec<ResolvedIndividual> = ["B1", "B2", "B4", "B1"]
        .iter()
        .enumerate()
        .map(|(i, code)| {
            let ind = Individual::new(i.to_string(), [Some("p"), Some("c"), Some("b")]);
            ResolvedIndividual::with_code(ind, *code, Some(3.0))
        })
        .collect();
    let members: MembershipSet = ["B1", "B2"].into_iter().collect();

    let classification = classify(&resolved, &members);
    let flags: Vec<bool> = classification.rows().iter().map(|c| c.affected).collect();
    assert_eq!(flags, vec![true, true, false, true]);
    assert_eq!(classification.share().percent(), Some(75.0));
}

#[test]
fn test_scenario_missing_finest_level_is_reported() {
    let gazetteer = Gazetteer::new(
        Hierarchy::default(),
        vec![GazetteerRow::new(["P1", "C1", "B1"], ["a", "b", "c"])],
    )
    .unwrap();
    let mut resolver = resolver_for(gazetteer);

    let roster = vec![
        Individual::new("ok", [Some("a"), Some("b"), Some("c")]),
        Individual::new("gap", [Some("a"), Some("b"), None]),
    ];
    let resolution = resolver.resolve(&roster).unwrap();

    assert_eq!(resolution.incomplete.len(), 1);
    assert_eq!(resolution.incomplete[0].id, "gap");
    assert_eq!(resolution.incomplete[0].missing_data(), "barangay");
    assert!(!resolution.resolved[1].is_resolved());
    assert_eq!(resolution.resolved[1].match_score, None);
    assert_eq!(resolution.resolved_count(), 1);
}

#[test]
fn test_city_level_matching() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::from_toml("[hierarchy]\nfinest_level = 2\n").unwrap();
    let gazetteer = load_gazetteer(&write(dir.path(), "gadm.csv", GAZETTEER), &config).unwrap();
    let roster = load_roster(&write(dir.path(), "roster.csv", ROSTER), &config).unwrap();

    let normalizer = config.normalizer(None).unwrap();
    let matcher = Matcher::new(Arc::new(gazetteer), &normalizer).unwrap();
    let mut resolver = Resolver::new(normalizer, matcher).unwrap();
    let resolution = resolver.resolve(&roster.individuals).unwrap();

    let codes: Vec<&str> = resolution
        .resolved
        .iter()
        .filter_map(|r| r.resolved_code.as_deref())
        .collect();
    assert_eq!(codes, vec!["C1", "C1", "C2", "C3", "C3"]);
    assert!(resolution.incomplete.is_empty());
}
