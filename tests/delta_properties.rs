// tests/delta_properties.rs
use padel_watch::state::StateSnapshot;
use padel_watch::{compare, diff, Comparison, Normalizer, RawRecord, TournamentRecord};

fn records(names: &[&str]) -> Vec<TournamentRecord> {
    let rows = names
        .iter()
        .enumerate()
        .map(|(i, n)| {
            RawRecord::new()
                .with("niveau", "P100")
                .with("club", "4PADEL Marville")
                .with("nom", n)
                .with("date", &format!("{:02}/03/2026", i + 1))
                .with("heure", "19h00")
        })
        .collect();
    Normalizer::default().normalize(rows).records
}

#[test]
fn additions_and_removals_are_disjoint_from_the_other_side() {
    let prev = StateSnapshot::from_records(records(&["A", "B", "C", "D"]));
    let current = records(&["A", "X", "C", "Y"]);
    let d = diff(&prev, &current);

    for a in &d.additions {
        assert!(!prev.contains(&a.key));
        assert!(current.iter().any(|c| c.key == a.key));
    }
    let current_keys: Vec<_> = current.iter().map(|c| &c.key).collect();
    for r in &d.removals {
        assert!(prev.contains(r));
        assert!(!current_keys.contains(&r));
    }

    // Exactly current - previous and previous - current, nothing dropped.
    let added: Vec<_> = d.additions.iter().map(|r| r.nom.as_str()).collect();
    assert_eq!(added, vec!["X", "Y"]);
    let removed: Vec<_> = d
        .removals
        .iter()
        .map(|k| prev.get(k).unwrap().nom.as_str())
        .collect();
    assert_eq!(removed, vec!["B", "D"]);
}

#[test]
fn diff_is_idempotent() {
    let prev = StateSnapshot::from_records(records(&["A", "B", "C"]));
    let current = records(&["B", "C", "D", "E"]);
    assert_eq!(diff(&prev, &current), diff(&prev, &current));
}

#[test]
fn disjoint_sets_swap_entirely() {
    let a = records(&["A1", "A2"]);
    let b = records(&["B1", "B2"]);
    let prev = StateSnapshot::from_records(a.clone());
    let d = diff(&prev, &b);

    assert_eq!(d.additions, b);
    let mut expected: Vec<_> = a.iter().map(|r| r.key.clone()).collect();
    expected.sort();
    assert_eq!(d.removals, expected);
}

#[test]
fn diff_against_advanced_state_is_empty() {
    let prev = StateSnapshot::from_records(records(&["A", "B"]));
    let current = records(&["B", "C", "D"]);
    let d = diff(&prev, &current);
    let next = StateSnapshot::advance(&prev, &current, &d, false);

    let again = diff(&next, &current);
    assert!(again.is_empty());
}

#[test]
fn same_scrape_twice_yields_nothing() {
    let current = records(&["A", "B", "C"]);
    let prev = StateSnapshot::from_records(current.clone());
    assert_eq!(compare(&prev, &current), Comparison::Changes(Default::default()));
}

#[test]
fn first_run_sees_everything_as_new() {
    let current = records(&["A", "B"]);
    let d = diff(&StateSnapshot::new(), &current);
    assert_eq!(d.additions, current);
    assert!(d.removals.is_empty());
}

#[test]
fn empty_scrape_is_guarded_only_with_prior_state() {
    let prev = StateSnapshot::from_records(records(&["A"]));
    assert!(matches!(compare(&prev, &[]), Comparison::EmptyScrape(w) if w.previous == 1));
    assert!(matches!(
        compare(&StateSnapshot::new(), &[]),
        Comparison::Changes(d) if d.is_empty()
    ));
}
