use fossil_core::types::{BackupInfo, CollectionKey, KeyQuery, VersionedValue};
use fossil_proto::v1 as wire;
use fossil_wire::{ConvertError, Reply, TryToCore, TryToWire};

#[test]
fn key_query_maps_to_list_keys_request() {
    let query = KeyQuery {
        collection: "skeletons".to_string(),
        start_after: Some("abc".to_string()),
        prefix: Some(String::new()),
        limit: 20,
    };
    let req: wire::ListKeysRequest = query.try_to_wire().unwrap();
    assert_eq!(req.collection, "skeletons");
    assert_eq!(req.limit, Some(20));
    assert_eq!(req.start_after_key.as_deref(), Some("abc"));
    assert_eq!(req.prefix, None);
}

#[test]
fn empty_collection_is_rejected_before_sending() {
    let query = KeyQuery::first_page("  ", 20);
    let res: Result<wire::ListKeysRequest, _> = query.try_to_wire();
    assert_eq!(
        res,
        Err(ConvertError::EmptyField {
            field: "collection"
        })
    );

    let ck = CollectionKey::new("volumeData", "");
    let res: Result<wire::GetRequest, _> = (&ck, None::<u64>).try_to_wire();
    assert_eq!(res, Err(ConvertError::EmptyField { field: "key" }));
}

#[test]
fn get_and_delete_requests_carry_the_version() {
    let ck = CollectionKey::new("volumeData", "k1");
    let get: wire::GetRequest = (&ck, Some(7u64)).try_to_wire().unwrap();
    assert_eq!(get.version, Some(7));
    let latest: wire::GetRequest = (&ck, None::<u64>).try_to_wire().unwrap();
    assert_eq!(latest.version, None);
    let del: wire::DeleteRequest = (&ck, 3u64).try_to_wire().unwrap();
    assert_eq!((del.key.as_str(), del.version), ("k1", 3));
}

#[test]
fn failed_reply_surfaces_the_server_message() {
    let reply = wire::GetReply {
        success: false,
        error_message: Some("key not found".to_string()),
        value: Vec::new(),
        actual_version: 0,
    };
    let res: Result<VersionedValue, _> = reply.try_to_core();
    assert_eq!(
        res,
        Err(ConvertError::Rejected {
            message: "key not found".to_string()
        })
    );

    let silent = wire::HealthReply {
        success: false,
        error_message: None,
    };
    assert_eq!(
        silent.check(),
        Err(ConvertError::Rejected {
            message: "no error message".to_string()
        })
    );
}

#[test]
fn successful_replies_convert() {
    let reply = wire::GetReply {
        success: true,
        error_message: None,
        value: vec![1, 2, 3],
        actual_version: 9,
    };
    assert_eq!(
        reply.try_to_core(),
        Ok(VersionedValue {
            version: 9,
            value: vec![1, 2, 3]
        })
    );

    let backup = wire::BackupReply {
        success: true,
        error_message: None,
        backup_info: Some(wire::BackupInfo {
            id: 1,
            timestamp: 2,
            size: 3,
        }),
    };
    assert_eq!(
        backup.try_to_core(),
        Ok(BackupInfo {
            id: 1,
            timestamp: 2,
            size_bytes: 3
        })
    );
}

#[test]
fn backup_reply_without_info_is_incomplete() {
    let backup = wire::BackupReply {
        success: true,
        error_message: None,
        backup_info: None,
    };
    let res: Result<BackupInfo, _> = backup.try_to_core();
    assert_eq!(
        res,
        Err(ConvertError::MissingField {
            field: "backup_info"
        })
    );
}
