//! Behaviour every `MetadataStore` implementation must share

use common::models::{NewModel, NewVersion, RuntimeArtifact, Task, VersionPatch, VersionStatus};

use crate::store::MetadataStore;

fn new_model(name: &str) -> NewModel {
    NewModel {
        namespace: "users/local-user".to_string(),
        name: name.to_string(),
        task: Task::Classification,
    }
}

fn artifact(name: &str, model_id: i64, version: u32, ensemble: bool) -> RuntimeArtifact {
    RuntimeArtifact {
        name: name.to_string(),
        model_id,
        version,
        runtime_version: 1,
        ensemble,
    }
}

pub async fn run_all(store: &dyn MetadataStore) {
    models_are_unique_per_namespace(store).await;
    version_numbers_are_never_reused(store).await;
    update_patches_fields(store).await;
    deleting_last_version_deletes_model(store).await;
    artifacts_follow_their_version(store).await;
    delete_model_cascades(store).await;
}

async fn models_are_unique_per_namespace(store: &dyn MetadataStore) {
    let model = store.insert_model(&new_model("unique")).await.unwrap();
    assert_eq!(model.task, Task::Classification);

    let err = store.insert_model(&new_model("unique")).await.unwrap_err();
    assert!(err.is_conflict(), "unexpected error: {}", err);

    let other = NewModel {
        namespace: "users/someone-else".to_string(),
        ..new_model("unique")
    };
    store.insert_model(&other).await.unwrap();

    let found = store.find_model("users/local-user", "unique").await.unwrap();
    assert_eq!(found.map(|m| m.id), Some(model.id));
    assert!(store.find_model("users/local-user", "absent").await.unwrap().is_none());
    assert!(store.get_model(-1).await.unwrap_err().is_not_found());

    let listed = store.list_models("users/someone-else").await.unwrap();
    assert_eq!(listed.len(), 1);
}

async fn version_numbers_are_never_reused(store: &dyn MetadataStore) {
    let model = store.insert_model(&new_model("numbering")).await.unwrap();

    let v1 = store.insert_version(model.id, &NewVersion::default()).await.unwrap();
    let v2 = store.insert_version(model.id, &NewVersion::default()).await.unwrap();
    assert_eq!((v1.number, v2.number), (1, 2));
    assert_eq!(v1.status, VersionStatus::Offline);

    store.delete_version(model.id, 2).await.unwrap();
    let v3 = store.insert_version(model.id, &NewVersion::default()).await.unwrap();
    assert_eq!(v3.number, 3);

    let numbers: Vec<u32> = store
        .list_versions(model.id)
        .await
        .unwrap()
        .iter()
        .map(|v| v.number)
        .collect();
    assert_eq!(numbers, vec![1, 3]);
    assert_eq!(store.latest_version(model.id).await.unwrap().map(|v| v.number), Some(3));

    assert!(store
        .insert_version(-1, &NewVersion::default())
        .await
        .unwrap_err()
        .is_not_found());
}

async fn update_patches_fields(store: &dyn MetadataStore) {
    let model = store.insert_model(&new_model("patching")).await.unwrap();
    let created = store
        .insert_version(
            model.id,
            &NewVersion {
                description: "first".to_string(),
                status: VersionStatus::Offline,
            },
        )
        .await
        .unwrap();

    let updated = store
        .update_version(model.id, 1, &VersionPatch::status(VersionStatus::Online))
        .await
        .unwrap();
    assert_eq!(updated.status, VersionStatus::Online);
    assert_eq!(updated.description, "first");
    assert!(updated.updated_at >= created.updated_at);

    let updated = store
        .update_version(model.id, 1, &VersionPatch::description("second"))
        .await
        .unwrap();
    assert_eq!(updated.status, VersionStatus::Online);
    assert_eq!(updated.description, "second");

    let reloaded = store.get_model(model.id).await.unwrap();
    assert!(reloaded.updated_at >= model.updated_at);

    assert!(store
        .update_version(model.id, 9, &VersionPatch::description("x"))
        .await
        .unwrap_err()
        .is_not_found());
}

async fn deleting_last_version_deletes_model(store: &dyn MetadataStore) {
    let model = store.insert_model(&new_model("last")).await.unwrap();
    store.insert_version(model.id, &NewVersion::default()).await.unwrap();
    store.insert_version(model.id, &NewVersion::default()).await.unwrap();

    let first = store.delete_version(model.id, 1).await.unwrap();
    assert_eq!(first.remaining, 1);
    assert!(!first.model_deleted);
    assert!(store.get_model(model.id).await.is_ok());

    let second = store.delete_version(model.id, 2).await.unwrap();
    assert_eq!(second.remaining, 0);
    assert!(second.model_deleted);
    assert!(store.get_model(model.id).await.unwrap_err().is_not_found());

    assert!(store.delete_version(model.id, 2).await.unwrap_err().is_not_found());
}

async fn artifacts_follow_their_version(store: &dyn MetadataStore) {
    let model = store.insert_model(&new_model("artifacts")).await.unwrap();
    store.insert_version(model.id, &NewVersion::default()).await.unwrap();
    store.insert_version(model.id, &NewVersion::default()).await.unwrap();

    store
        .insert_artifact(&artifact("local-user#artifacts#ensemble#1", model.id, 1, true))
        .await
        .unwrap();
    store
        .insert_artifact(&artifact("local-user#artifacts#infer#1", model.id, 1, false))
        .await
        .unwrap();
    store
        .insert_artifact(&artifact("local-user#artifacts#ensemble#2", model.id, 2, true))
        .await
        .unwrap();

    let dup = store
        .insert_artifact(&artifact("local-user#artifacts#ensemble#1", model.id, 1, true))
        .await
        .unwrap_err();
    assert!(dup.is_conflict(), "unexpected error: {}", dup);

    let orphan = store
        .insert_artifact(&artifact("orphan", model.id, 7, true))
        .await
        .unwrap_err();
    assert!(orphan.is_not_found(), "unexpected error: {}", orphan);

    assert_eq!(store.list_artifacts(model.id).await.unwrap().len(), 3);
    assert_eq!(store.list_version_artifacts(model.id, 1).await.unwrap().len(), 2);

    store.delete_version(model.id, 1).await.unwrap();
    let left = store.list_artifacts(model.id).await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].version, 2);
}

async fn delete_model_cascades(store: &dyn MetadataStore) {
    let model = store.insert_model(&new_model("cascade")).await.unwrap();
    store.insert_version(model.id, &NewVersion::default()).await.unwrap();
    store
        .insert_artifact(&artifact("local-user#cascade#ensemble#1", model.id, 1, true))
        .await
        .unwrap();

    store.delete_model(model.id).await.unwrap();

    assert!(store.get_model(model.id).await.unwrap_err().is_not_found());
    assert!(store.list_versions(model.id).await.unwrap().is_empty());
    assert!(store.list_artifacts(model.id).await.unwrap().is_empty());
    assert!(store.delete_model(model.id).await.unwrap_err().is_not_found());

    // The name is free again
    store.insert_model(&new_model("cascade")).await.unwrap();
}
