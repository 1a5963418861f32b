// ABOUTME: Type-aware single-key copier
// ABOUTME: Looks up a key's type and queues the writes that recreate it downstream

use crate::error::CopyError;
use crate::migration::batch::WriteBatcher;
use crate::store::{KeyType, SourceOps, WriteOp};

/// Copy one key from the source into the write batch.
///
/// Reads the key's current type, then its value, and queues the write
/// operation(s) that will recreate it at the destination. Nothing is sent
/// here (the batcher decides when queued writes flush) and the source is
/// never mutated.
///
/// Values are copied verbatim per type: string bytes, list order, set
/// membership, hash fields, sorted-set scores, and stream entries with
/// their original ids in ascending order (one queued write per entry).
///
/// An aggregate read that comes back empty means the key vanished after
/// the type lookup (Redis deletes empty collections) and is reported as
/// [`CopyError::Vanished`], like a string `GET` answering nil. Streams are
/// the exception: a stream may legitimately exist with zero entries, and
/// copying one queues nothing.
pub async fn copy_key<S: SourceOps>(
    source: &mut S,
    key: &str,
    batch: &mut WriteBatcher,
) -> Result<(), CopyError> {
    let kind = source.type_of(key).await.map_err(CopyError::TypeLookup)?;

    match kind {
        KeyType::String => {
            let value = source.get_string(key).await.map_err(|e| CopyError::Read {
                kind: KeyType::String,
                source: e,
            })?;
            match value {
                Some(value) => batch.enqueue(WriteOp::Set {
                    key: key.to_string(),
                    value,
                }),
                None => return Err(CopyError::Vanished {
                    kind: KeyType::String,
                }),
            }
        }
        KeyType::List => {
            let values = source
                .list_range(key, 0, -1)
                .await
                .map_err(|e| CopyError::Read {
                    kind: KeyType::List,
                    source: e,
                })?;
            if values.is_empty() {
                return Err(CopyError::Vanished {
                    kind: KeyType::List,
                });
            }
            batch.enqueue(WriteOp::ListAppendAll {
                key: key.to_string(),
                values,
            });
        }
        KeyType::Set => {
            let members = source
                .set_members(key)
                .await
                .map_err(|e| CopyError::Read {
                    kind: KeyType::Set,
                    source: e,
                })?;
            if members.is_empty() {
                return Err(CopyError::Vanished { kind: KeyType::Set });
            }
            batch.enqueue(WriteOp::SetAddAll {
                key: key.to_string(),
                members,
            });
        }
        KeyType::Hash => {
            let fields = source
                .hash_fields(key)
                .await
                .map_err(|e| CopyError::Read {
                    kind: KeyType::Hash,
                    source: e,
                })?;
            if fields.is_empty() {
                return Err(CopyError::Vanished {
                    kind: KeyType::Hash,
                });
            }
            batch.enqueue(WriteOp::HashSetAll {
                key: key.to_string(),
                fields,
            });
        }
        KeyType::SortedSet => {
            let members = source
                .sorted_set_with_scores(key)
                .await
                .map_err(|e| CopyError::Read {
                    kind: KeyType::SortedSet,
                    source: e,
                })?;
            if members.is_empty() {
                return Err(CopyError::Vanished {
                    kind: KeyType::SortedSet,
                });
            }
            batch.enqueue(WriteOp::SortedSetAddAll {
                key: key.to_string(),
                // ZADD takes score before member
                members: members.into_iter().map(|(m, s)| (s, m)).collect(),
            });
        }
        KeyType::Stream => {
            let entries = source
                .stream_entries(key)
                .await
                .map_err(|e| CopyError::Read {
                    kind: KeyType::Stream,
                    source: e,
                })?;
            for entry in entries {
                batch.enqueue(WriteOp::StreamAppend {
                    key: key.to_string(),
                    id: entry.id,
                    fields: entry.fields,
                });
            }
        }
        KeyType::Unsupported(tag) => return Err(CopyError::UnsupportedType(tag)),
    }

    Ok(())
}
