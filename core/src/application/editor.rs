// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Object Services
//!
//! Creating, reading, fetching and editing repository objects over a
//! [`Connection`].
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Implements create/read/fetch and the lock-write-unlock cycle

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::marshal::{deserialize, serialize, MarshalError};
use crate::domain::connection::{Connection, ConnectionError, Request};
use crate::domain::objects::{collection_uri, RepositoryObject, SourceObject};

const LOCK_ACCEPT: &str =
    "application/*,application/vnd.sap.as+xml;charset=UTF-8;dataname=com.sap.adt.lock.result";

const SOURCE_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Marshal(#[from] MarshalError),

    #[error("The lock response for {uri} does not contain a lock handle")]
    MissingLockHandle { uri: String },
}

/// Creates a new object on the server
pub async fn create<O: RepositoryObject>(
    connection: &dyn Connection,
    object: &O,
    corrnr: Option<&str>,
) -> Result<(), EditorError> {
    let kind = object.kind();
    let body = serialize(object)?;

    let mut request = Request::post(collection_uri(kind))
        .header("Content-Type", kind.media_type)
        .body(body);

    if let Some(corrnr) = corrnr {
        request = request.param("corrNr", corrnr);
    }

    info!("Creating {} {}", kind.element_name(), object.uri());
    connection.execute(request).await?;
    Ok(())
}

/// Reads the source code of an object
pub async fn read_source(
    connection: &dyn Connection,
    object: &dyn SourceObject,
) -> Result<String, EditorError> {
    let request = Request::get(object.source_uri()).header("Accept", "text/plain");
    let response = connection.execute(request).await?;
    Ok(response.text)
}

/// Populates `object` with the server's view of it
pub async fn fetch<O: RepositoryObject>(
    connection: &dyn Connection,
    object: &mut O,
) -> Result<(), EditorError> {
    let request = Request::get(object.uri()).header("Accept", object.kind().media_type);
    let response = connection.execute(request).await?;

    deserialize(&response.text, object)?;
    Ok(())
}

/// Locks the object at `uri` for modification and returns the lock handle
pub async fn lock(connection: &dyn Connection, uri: &str) -> Result<String, EditorError> {
    let request = Request::post(uri)
        .param("_action", "LOCK")
        .param("accessMode", "MODIFY")
        .header("Accept", LOCK_ACCEPT);

    let response = connection.execute(request).await?;

    let handle = parse_lock_handle(&response.text)?.ok_or_else(|| EditorError::MissingLockHandle {
        uri: uri.to_string(),
    })?;

    debug!("Locked {}", uri);
    Ok(handle)
}

pub async fn unlock(connection: &dyn Connection, uri: &str, handle: &str) -> Result<(), EditorError> {
    let request = Request::post(uri)
        .param("_action", "UNLOCK")
        .param("lockHandle", handle);

    connection.execute(request).await?;
    debug!("Unlocked {}", uri);
    Ok(())
}

pub async fn write_source(
    connection: &dyn Connection,
    source_uri: &str,
    handle: &str,
    text: &str,
    corrnr: Option<&str>,
) -> Result<(), EditorError> {
    let mut request = Request::put(source_uri)
        .param("lockHandle", handle)
        .header("Content-Type", SOURCE_CONTENT_TYPE)
        .body(text);

    if let Some(corrnr) = corrnr {
        request = request.param("corrNr", corrnr);
    }

    connection.execute(request).await?;
    Ok(())
}

/// Extracts the text of the `LOCK_HANDLE` element of a lock result
fn parse_lock_handle(xml: &str) -> Result<Option<String>, MarshalError> {
    let mut reader = Reader::from_str(xml);
    let mut inside = false;

    loop {
        let event = reader.read_event().map_err(|e| MarshalError::Syntax {
            position: reader.buffer_position() as u64,
            message: e.to_string(),
        })?;

        match event {
            Event::Start(start) => inside = start.local_name().as_ref() == b"LOCK_HANDLE",
            Event::Text(text) if inside => {
                let handle = text.unescape().map_err(|e| MarshalError::Syntax {
                    position: reader.buffer_position() as u64,
                    message: e.to_string(),
                })?;
                return Ok(Some(handle.into_owned()));
            }
            Event::End(_) => inside = false,
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Source editing session: every write locks the object, writes the source
/// and releases the lock again, also when the write fails.
pub struct Editor<'c> {
    connection: &'c dyn Connection,
    corrnr: Option<String>,
}

impl<'c> Editor<'c> {
    pub fn new(connection: &'c dyn Connection) -> Self {
        Self {
            connection,
            corrnr: None,
        }
    }

    /// Records changes on the given transport request
    pub fn with_corrnr(mut self, corrnr: Option<String>) -> Self {
        self.corrnr = corrnr;
        self
    }

    pub async fn write(&self, object: &dyn SourceObject, text: &str) -> Result<(), EditorError> {
        let lock_uri = object.lock_uri();
        let handle = lock(self.connection, &lock_uri).await?;

        let written = write_source(
            self.connection,
            &object.source_uri(),
            &handle,
            text,
            self.corrnr.as_deref(),
        )
        .await;

        let unlocked = unlock(self.connection, &lock_uri, &handle).await;

        match (written, unlocked) {
            (Err(err), Err(unlock_err)) => {
                warn!("Failed to unlock {} after a failed write: {}", lock_uri, unlock_err);
                Err(err)
            }
            (Err(err), Ok(())) => Err(err),
            (Ok(()), unlocked) => {
                unlocked?;
                info!("Written {}", object.source_uri());
                Ok(())
            }
        }
    }
}
