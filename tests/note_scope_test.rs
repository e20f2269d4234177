//! Scope fallback for single-entity operations: lookup, delete, share.

use notescope::store::memory::fixtures::ServiceFixture;
use notescope::store::records::NoteRecord;
use notescope::store::{NoteStore, ServiceError};
use notescope::{Error, Note, Scope};

const TOKEN_A: &str = "S=s2:U=77:E=157e:C=9a1:P=85:A=pads:H=12aa";
const TOKEN_B: &str = "S=s3:U=88:E=157e:C=9a1:P=85:A=pads:H=34bb";

fn note_record(guid: &str, title: &str) -> NoteRecord {
    NoteRecord {
        guid: Some(guid.to_string()),
        title: title.to_string(),
        content: Some(format!("<doc>{}</doc>", title)),
        ..Default::default()
    }
}

/// Personal store plus two linked notebooks on their own stores.
fn setup() -> ServiceFixture {
    let fixture = ServiceFixture::new();
    let remote_a = fixture.add_store("https://notes.example.com/shard/s2/notestore", "remote-a");
    let remote_b = fixture.add_store("https://notes.example.com/shard/s3/notestore", "remote-b");
    fixture.link_remote_notebook(&remote_a, "nb-a", "Alpha", "sk-a", TOKEN_A);
    fixture.link_remote_notebook(&remote_b, "nb-b", "Beta", "sk-b", TOKEN_B);
    fixture
}

fn loose_note(guid: &str) -> Note {
    let mut note = Note::new("loose", "");
    note.guid = Some(guid.to_string());
    note
}

#[test]
fn personal_scope_miss_is_absent_without_linked_walk() {
    let fixture = setup();
    let client = fixture.client();

    let found = client.get_note("missing", Some(Scope::Personal)).unwrap();
    assert!(found.is_none());

    let calls = fixture.gateway.calls();
    assert!(!calls.iter().any(|call| call.starts_with("remote-")));
}

#[test]
fn personal_store_is_tried_before_any_linked_store() {
    let fixture = setup();
    fixture
        .gateway
        .store("https://notes.example.com/shard/s2/notestore")
        .unwrap()
        .put_note(note_record("x", "In Alpha"));

    let found = fixture.client().get_note("x", None).unwrap().unwrap();
    assert_eq!(found.auth_token.as_deref(), Some(TOKEN_A));

    let calls = fixture.gateway.calls();
    let personal_at = calls
        .iter()
        .position(|call| call == "personal:get_note")
        .expect("personal store was never asked");
    let linked_at = calls
        .iter()
        .position(|call| call == "remote-a:authenticate_to_shared_notebook")
        .expect("linked store was never asked");
    assert!(personal_at < linked_at);
}

#[test]
fn personal_failure_other_than_not_found_is_fatal() {
    let fixture = setup();
    fixture.personal.force_error(
        "get_note",
        ServiceError::System("shard down".to_string()),
    );

    let result = fixture.client().get_note("x", None);
    assert_eq!(
        result.unwrap_err(),
        Error::RemoteSystem("shard down".to_string())
    );

    // No linked store was contacted after the failure.
    let calls = fixture.gateway.calls();
    assert!(!calls.iter().any(|call| call.starts_with("remote-")));
}

#[test]
fn linked_walk_stops_at_the_first_hit() {
    let fixture = setup();
    fixture
        .gateway
        .store("https://notes.example.com/shard/s2/notestore")
        .unwrap()
        .put_note(note_record("x", "In Alpha"));

    let found = fixture.client().get_note("x", None).unwrap().unwrap();
    assert_eq!(found.auth_token.as_deref(), Some(TOKEN_A));

    let calls = fixture.gateway.calls();
    assert!(!calls.iter().any(|call| call.starts_with("remote-b:")));
}

#[test]
fn guid_existing_nowhere_is_absent_not_an_error() {
    let fixture = setup();
    let client = fixture.client();

    assert!(client.get_note("ghost", None).unwrap().is_none());
    assert!(client.get_note("ghost", Some(Scope::Linked)).unwrap().is_none());
    assert!(client.get_notebook("ghost", None).unwrap().is_none());
    assert!(client
        .get_notebook("ghost", Some(Scope::Personal))
        .unwrap()
        .is_none());
}

#[test]
fn walk_continues_past_denied_notebooks() {
    let fixture = ServiceFixture::new();
    // First descriptor points at a store that refuses the share key.
    let locked = fixture.add_store("https://notes.example.com/shard/s2/notestore", "locked");
    fixture.link_descriptor("Locked", locked.url(), Some("sk-x"));
    let remote = fixture.add_store("https://notes.example.com/shard/s3/notestore", "remote");
    fixture.link_remote_notebook(&remote, "nb-b", "Beta", "sk-b", TOKEN_B);
    remote.put_note(note_record("x", "In Beta"));

    let found = fixture.client().get_note("x", None).unwrap().unwrap();
    assert_eq!(found.auth_token.as_deref(), Some(TOKEN_B));
}

#[test]
fn notebook_lookup_matches_target_guid_across_links() {
    let fixture = setup();

    let found = fixture
        .client()
        .get_notebook("nb-b", Some(Scope::Linked))
        .unwrap()
        .unwrap();

    assert_eq!(found.guid.as_deref(), Some("nb-b"));
    assert_eq!(found.auth_token.as_deref(), Some(TOKEN_B));
    assert!(found.is_linked());
}

#[test]
fn personal_notebook_lookup_does_not_fall_back_when_scoped() {
    let fixture = setup();
    let found = fixture
        .client()
        .get_notebook("nb-b", Some(Scope::Personal))
        .unwrap();
    assert!(found.is_none());
}

#[test]
fn delete_without_credentials_searches_linked_scope() {
    let fixture = setup();
    let remote_b = fixture
        .gateway
        .store("https://notes.example.com/shard/s3/notestore")
        .unwrap();
    remote_b.put_note(note_record("x", "In Beta"));

    let deleted = fixture.client().delete_note(&loose_note("x")).unwrap();

    assert!(deleted);
    assert!(remote_b.note("x").is_none());

    // Personal first, then the walk found it in the second notebook.
    let calls = fixture.gateway.calls();
    let personal_at = calls
        .iter()
        .position(|call| call == "personal:delete_note")
        .unwrap();
    let remote_at = calls
        .iter()
        .position(|call| call == "remote-b:delete_note")
        .unwrap();
    assert!(personal_at < remote_at);
}

#[test]
fn delete_uses_carried_credentials_directly() {
    let fixture = setup();
    let remote_a = fixture
        .gateway
        .store("https://notes.example.com/shard/s2/notestore")
        .unwrap();
    remote_a.put_note(note_record("x", "In Alpha"));

    let client = fixture.client();
    let fetched = client.get_note("x", None).unwrap().unwrap();
    let calls_before = fixture.gateway.calls().len();

    assert!(client.delete_note(&fetched).unwrap());
    assert!(remote_a.note("x").is_none());

    // One direct call against the owning endpoint, no new resolution.
    let calls = fixture.gateway.calls();
    assert_eq!(calls.len(), calls_before + 1);
    assert_eq!(calls.last().map(String::as_str), Some("remote-a:delete_note"));
}

#[test]
fn delete_with_stale_credentials_refinds_the_note() {
    let fixture = setup();
    let remote_a = fixture
        .gateway
        .store("https://notes.example.com/shard/s2/notestore")
        .unwrap();
    remote_a.put_note(note_record("x", "In Alpha"));

    let client = fixture.client();
    let fetched = client.get_note("x", None).unwrap().unwrap();

    // The note moved: gone from the linked store, present personally.
    remote_a.delete_note(TOKEN_A, "x").unwrap();
    fixture.personal.put_note(note_record("x", "Back home"));

    assert!(client.delete_note(&fetched).unwrap());
    assert!(fixture.personal.note("x").is_none());
}

#[test]
fn delete_of_nonexistent_note_is_false_not_an_error() {
    let fixture = setup();
    assert!(!fixture.client().delete_note(&loose_note("ghost")).unwrap());
}

#[test]
fn delete_of_never_saved_note_is_invalid_input() {
    let fixture = ServiceFixture::new();
    let result = fixture.client().delete_note(&Note::new("draft", "body"));
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[test]
fn share_personal_note_composes_the_public_url() {
    let fixture = ServiceFixture::new();
    fixture.personal.put_note(note_record("note-1", "Minutes"));

    let url = fixture
        .client()
        .share_note(&loose_note("note-1"))
        .unwrap()
        .unwrap();

    assert!(
        url.starts_with("https://notes.example.com/shard/s1/sh/note-1/sh-"),
        "unexpected share url: {}",
        url
    );
}

#[test]
fn share_falls_back_to_linked_scope() {
    let fixture = setup();
    fixture
        .gateway
        .store("https://notes.example.com/shard/s3/notestore")
        .unwrap()
        .put_note(note_record("x", "In Beta"));

    let url = fixture
        .client()
        .share_note(&loose_note("x"))
        .unwrap()
        .unwrap();

    // Shard of the owning (linked) token, not the personal one.
    assert!(
        url.starts_with("https://notes.example.com/shard/s3/sh/x/sh-"),
        "unexpected share url: {}",
        url
    );
}

#[test]
fn share_of_nonexistent_note_is_absent() {
    let fixture = setup();
    assert!(fixture.client().share_note(&loose_note("ghost")).unwrap().is_none());
}
