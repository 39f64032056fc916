//! Rule matching throughput over realistic rule-set sizes.

use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::{Value, json};
use std::hint::black_box;

use entrepot_core::{EntityId, EntitySnapshot, RuleId};
use entrepot_rules::{ActionKind, Condition, Operator, Rule, RuleScope, match_first};

fn snapshot() -> EntitySnapshot {
    let fields = json!({
        "valeur_totale": 4250,
        "poids": 12.5,
        "pays_destination": "FR",
        "contient_verre": false,
        "client": { "nom_entreprise": "Acme SARL", "segment": "standard" }
    });
    let Value::Object(map) = fields else {
        unreachable!();
    };
    EntitySnapshot::new("order", EntityId::new(), map)
}

fn rule_set(size: usize) -> Vec<Rule> {
    (0..size)
        .map(|i| {
            let threshold = (i as i64 + 1) * 100;
            Rule::new(
                RuleId::new(),
                RuleScope::Global,
                ActionKind::AlertOnly,
                i as i32,
            )
            .with_conditions(vec![
                Condition::new("valeur_totale", Operator::GreaterThan, json!(threshold)),
                Condition::new("pays_destination", Operator::Equals, json!("DE")),
            ])
        })
        .collect()
}

fn bench_match_first(c: &mut Criterion) {
    let snapshot = snapshot();

    let mut group = c.benchmark_group("match_first");
    for size in [10usize, 100, 500] {
        let rules = rule_set(size);
        group.bench_function(format!("{size}_rules_no_match"), |b| {
            b.iter(|| match_first(black_box(&snapshot), black_box(&rules)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_match_first);
criterion_main!(benches);
