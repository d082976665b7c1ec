use atoll::concepts::label::Labeling;
use atoll::core::dispatch::Outcome;
use atoll::core::id::Id;
use atoll::core::store::Store;
use atoll::core::value::{Record, Value};
use tempfile::tempdir;

fn setup() -> (tempfile::TempDir, Store, Labeling) {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();
    let concept = Labeling::bind(&store).unwrap();
    (tmp, store, concept)
}

fn label_id(concept: &Labeling, name: &str) -> Id {
    let filter = Record::new().with("name", Value::Str(name.to_string()));
    let found = concept.labels(&filter).unwrap();
    assert_eq!(found.len(), 1);
    found[0].id().unwrap().clone()
}

fn item_labels(concept: &Labeling, item: &Id) -> Vec<Value> {
    let filter = Record::new().with("_id", Value::Id(item.clone()));
    let found = concept.items(&filter).unwrap();
    match found.first().and_then(|rec| rec.get("labels")) {
        Some(Value::List(members)) => members.clone(),
        _ => Vec::new(),
    }
}

#[test]
fn test_create_label_then_query_shows_it() {
    let (_tmp, _store, concept) = setup();

    let input = Record::new().with("name", Value::Str("urgent".into()));
    let outcome = concept.create_label(&input).unwrap();
    assert_eq!(outcome, Outcome::ok());

    let filter = Record::new().with("name", Value::Str("urgent".into()));
    let found = concept.labels(&filter).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get("name"), Some(&Value::Str("urgent".into())));
    assert!(found[0].id().is_some());
}

#[test]
fn test_create_label_conflict_leaves_state_unchanged() {
    let (_tmp, _store, concept) = setup();

    let input = Record::new().with("name", Value::Str("urgent".into()));
    concept.create_label(&input).unwrap();
    let before = concept.labels(&Record::new()).unwrap();

    let outcome = concept.create_label(&input).unwrap();
    assert!(matches!(outcome, Outcome::Error(_)));

    let after = concept.labels(&Record::new()).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_add_label_unknown_label_is_error() {
    let (_tmp, _store, concept) = setup();
    let item = Id::fresh();

    let input = Record::new()
        .with("item", Value::Id(item.clone()))
        .with("label", Value::Id(Id::unchecked("01J00000000000000000000000")));
    let outcome = concept.add_label(&input).unwrap();
    assert_eq!(outcome, Outcome::error("label not found"));

    // The item shows no labels afterwards.
    assert!(item_labels(&concept, &item).is_empty());
}

#[test]
fn test_add_label_attaches_exactly_once() {
    let (_tmp, _store, concept) = setup();

    concept
        .create_label(&Record::new().with("name", Value::Str("urgent".into())))
        .unwrap();
    let label = label_id(&concept, "urgent");
    let item = Id::fresh();

    let input = Record::new()
        .with("item", Value::Id(item.clone()))
        .with("label", Value::Id(label.clone()));
    let outcome = concept.add_label(&input).unwrap();
    assert_eq!(outcome, Outcome::ok());

    let members = item_labels(&concept, &item);
    assert_eq!(members, vec![Value::Id(label)]);
}

#[test]
fn test_add_label_is_idempotent() {
    let (_tmp, _store, concept) = setup();

    concept
        .create_label(&Record::new().with("name", Value::Str("urgent".into())))
        .unwrap();
    let label = label_id(&concept, "urgent");
    let item = Id::fresh();

    let input = Record::new()
        .with("item", Value::Id(item.clone()))
        .with("label", Value::Id(label.clone()));
    concept.add_label(&input).unwrap();
    let once = concept.items(&Record::new()).unwrap();

    // Documented effect is "ensure membership": the repeat is a success
    // no-op, still exactly one occurrence.
    let outcome = concept.add_label(&input).unwrap();
    assert_eq!(outcome, Outcome::ok());
    let twice = concept.items(&Record::new()).unwrap();
    assert_eq!(once, twice);
    assert_eq!(item_labels(&concept, &item), vec![Value::Id(label)]);
}

#[test]
fn test_delete_label_never_attached_is_error() {
    let (_tmp, _store, concept) = setup();

    concept
        .create_label(&Record::new().with("name", Value::Str("urgent".into())))
        .unwrap();
    concept
        .create_label(&Record::new().with("name", Value::Str("later".into())))
        .unwrap();
    let urgent = label_id(&concept, "urgent");
    let later = label_id(&concept, "later");
    let item = Id::fresh();

    concept
        .add_label(
            &Record::new()
                .with("item", Value::Id(item.clone()))
                .with("label", Value::Id(urgent.clone())),
        )
        .unwrap();
    let before_items = concept.items(&Record::new()).unwrap();
    let before_labels = concept.labels(&Record::new()).unwrap();

    let outcome = concept
        .delete_label(
            &Record::new()
                .with("item", Value::Id(item.clone()))
                .with("label", Value::Id(later)),
        )
        .unwrap();
    assert_eq!(outcome, Outcome::error("label not attached"));

    assert_eq!(before_items, concept.items(&Record::new()).unwrap());
    assert_eq!(before_labels, concept.labels(&Record::new()).unwrap());
}

#[test]
fn test_delete_label_removes_membership() {
    let (_tmp, _store, concept) = setup();

    concept
        .create_label(&Record::new().with("name", Value::Str("urgent".into())))
        .unwrap();
    let label = label_id(&concept, "urgent");
    let item = Id::fresh();

    let pair = Record::new()
        .with("item", Value::Id(item.clone()))
        .with("label", Value::Id(label.clone()));
    concept.add_label(&pair).unwrap();
    let outcome = concept.delete_label(&pair).unwrap();
    assert_eq!(outcome, Outcome::ok());
    assert!(item_labels(&concept, &item).is_empty());

    // Deleting again: the label is no longer attached.
    let outcome = concept.delete_label(&pair).unwrap();
    assert_eq!(outcome, Outcome::error("label not attached"));
}

#[test]
fn test_items_query_finds_by_label_containment() {
    let (_tmp, _store, concept) = setup();

    concept
        .create_label(&Record::new().with("name", Value::Str("urgent".into())))
        .unwrap();
    let label = label_id(&concept, "urgent");
    let tagged = Id::fresh();
    let untagged = Id::fresh();

    concept
        .add_label(
            &Record::new()
                .with("item", Value::Id(tagged.clone()))
                .with("label", Value::Id(label.clone())),
        )
        .unwrap();
    // Give the second item a different label so it has a document too.
    concept
        .create_label(&Record::new().with("name", Value::Str("later".into())))
        .unwrap();
    let later = label_id(&concept, "later");
    concept
        .add_label(
            &Record::new()
                .with("item", Value::Id(untagged.clone()))
                .with("label", Value::Id(later)),
        )
        .unwrap();

    let filter = Record::new().with("labels", Value::Id(label));
    let found = concept.items(&filter).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id(), Some(&tagged));
}

#[test]
fn test_malformed_input_is_an_error_record() {
    let (_tmp, _store, concept) = setup();

    // Missing field.
    let outcome = concept.create_label(&Record::new()).unwrap();
    assert!(matches!(outcome, Outcome::Error(_)));

    // Extra field.
    let outcome = concept
        .create_label(
            &Record::new()
                .with("name", Value::Str("x".into()))
                .with("color", Value::Str("red".into())),
        )
        .unwrap();
    assert!(matches!(outcome, Outcome::Error(_)));

    // Wrong type: a string where an id is expected.
    let outcome = concept
        .add_label(
            &Record::new()
                .with("item", Value::Str("not-an-id".into()))
                .with("label", Value::Id(Id::fresh())),
        )
        .unwrap();
    assert!(matches!(outcome, Outcome::Error(_)));
}
