use atoll::concepts::comment::Comment;
use atoll::concepts::user::User;
use atoll::core::concept::Concept;
use atoll::core::dispatch::Outcome;
use atoll::core::id::Id;
use atoll::core::store::Store;
use atoll::core::value::{Record, Value};
use tempfile::tempdir;

fn setup() -> (tempfile::TempDir, Store, Comment) {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();
    let concept = Comment::bind(&store).unwrap();
    (tmp, store, concept)
}

fn post(concept: &Comment, author: &Id, target: &Id, text: &str) -> Id {
    let input = Record::new()
        .with("author", Value::Id(author.clone()))
        .with("target", Value::Id(target.clone()))
        .with("text", Value::Str(text.to_string()));
    match concept.post(&input).unwrap() {
        Outcome::Success(rec) => match rec.get("comment") {
            Some(Value::Id(id)) => id.clone(),
            other => panic!("post returned {:?}", other),
        },
        Outcome::Error(e) => panic!("post failed: {}", e),
    }
}

#[test]
fn test_post_then_query_by_target_in_posting_order() {
    let (_tmp, _store, concept) = setup();
    let author = Id::fresh();
    let target = Id::fresh();

    let first = post(&concept, &author, &target, "first");
    let second = post(&concept, &author, &target, "second");
    post(&concept, &author, &Id::fresh(), "elsewhere");

    let found = concept
        .comments(&Record::new().with("target", Value::Id(target)))
        .unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].id(), Some(&first));
    assert_eq!(found[1].id(), Some(&second));
    assert_eq!(found[0].get("text"), Some(&Value::Str("first".into())));
}

#[test]
fn test_empty_text_is_rejected() {
    let (_tmp, _store, concept) = setup();

    let input = Record::new()
        .with("author", Value::Id(Id::fresh()))
        .with("target", Value::Id(Id::fresh()))
        .with("text", Value::Str("   ".into()));
    let outcome = concept.post(&input).unwrap();
    assert_eq!(outcome, Outcome::error("text must not be empty"));
    assert!(concept.comments(&Record::new()).unwrap().is_empty());
}

#[test]
fn test_edit_replaces_text_and_nothing_else() {
    let (_tmp, _store, concept) = setup();
    let author = Id::fresh();
    let target = Id::fresh();
    let comment = post(&concept, &author, &target, "tpyo");

    let outcome = concept
        .edit(
            &Record::new()
                .with("comment", Value::Id(comment.clone()))
                .with("text", Value::Str("typo".into())),
        )
        .unwrap();
    assert_eq!(outcome, Outcome::ok());

    let found = concept
        .comments(&Record::new().with("_id", Value::Id(comment)))
        .unwrap();
    assert_eq!(found[0].get("text"), Some(&Value::Str("typo".into())));
    assert_eq!(found[0].get("author"), Some(&Value::Id(author)));
    assert_eq!(found[0].get("target"), Some(&Value::Id(target)));
}

#[test]
fn test_remove_deletes_and_missing_comment_is_error() {
    let (_tmp, _store, concept) = setup();
    let comment = post(&concept, &Id::fresh(), &Id::fresh(), "bye");

    let outcome = concept
        .remove(&Record::new().with("comment", Value::Id(comment.clone())))
        .unwrap();
    assert_eq!(outcome, Outcome::ok());
    assert!(concept.comments(&Record::new()).unwrap().is_empty());

    let outcome = concept
        .remove(&Record::new().with("comment", Value::Id(comment)))
        .unwrap();
    assert_eq!(outcome, Outcome::error("comment not found"));
}

// A minimal stand-in for the external coordinator: it drives two concepts
// through the closed `Concept` surface, by operation name, passing nothing
// between them but Identifier values.
#[test]
fn test_concepts_compose_by_identifier_only() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();
    let users: Box<dyn Concept> = Box::new(User::bind(&store).unwrap());
    let comments: Box<dyn Concept> = Box::new(Comment::bind(&store).unwrap());

    let outcome = users
        .act("register", &Record::new().with("name", Value::Str("alice".into())))
        .unwrap();
    let author = match outcome {
        Outcome::Success(rec) => match rec.get("user") {
            Some(Value::Id(id)) => id.clone(),
            other => panic!("register returned {:?}", other),
        },
        Outcome::Error(e) => panic!("register failed: {}", e),
    };

    let target = Id::fresh();
    let outcome = comments
        .act(
            "post",
            &Record::new()
                .with("author", Value::Id(author.clone()))
                .with("target", Value::Id(target))
                .with("text", Value::Str("hello".into())),
        )
        .unwrap();
    assert!(outcome.is_success());

    let found = comments
        .query("_comments", &Record::new().with("author", Value::Id(author.clone())))
        .unwrap();
    assert_eq!(found.len(), 1);

    // The author id round-trips opaquely: it still resolves in User.
    let resolved = users
        .query("_users", &Record::new().with("_id", Value::Id(author)))
        .unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].get("name"), Some(&Value::Str("alice".into())));
}
