//! Files from drops, pastes and the file picker.
//!
//! The browser hands over `File` objects; the shell only needs their
//! metadata to issue tickets, and their bytes once read. Reads are spawned
//! on the local executor and complete in whatever order the browser
//! finishes them.

use bytes::Bytes;
use prompt_editor_core::{FileMeta, IngestError, IngestTicket};
use wasm_bindgen_futures::JsFuture;
use web_sys::{DataTransfer, File, FileList};

/// Files in a list, in order.
pub fn files_from_list(list: &FileList) -> Vec<File> {
    (0..list.length()).filter_map(|i| list.get(i)).collect()
}

/// Files carried by a drop or paste.
pub fn files_from_data_transfer(data: &DataTransfer) -> Vec<File> {
    data.files().map(|list| files_from_list(&list)).unwrap_or_default()
}

pub fn file_meta(file: &File) -> FileMeta {
    FileMeta::new(file.name(), file.type_(), file.size() as u64)
}

/// Pair the shell's tickets with the files they were issued for. Tickets
/// cover the image files only, in list order.
pub fn pair_tickets(files: Vec<File>, tickets: Vec<IngestTicket>) -> Vec<(IngestTicket, File)> {
    let images = files.into_iter().filter(|f| file_meta(f).is_image());
    tickets.into_iter().zip(images).collect()
}

/// Read a file's contents.
pub async fn read_file(file: &File) -> Result<Bytes, IngestError> {
    let fail = |err: wasm_bindgen::JsValue| IngestError::Read {
        name: file.name(),
        reason: format!("{err:?}"),
    };
    let buffer = JsFuture::from(file.array_buffer()).await.map_err(fail)?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
    Ok(Bytes::from(bytes))
}

/// Read every paired file concurrently and report each completion.
pub fn spawn_reads<F>(reads: Vec<(IngestTicket, File)>, on_done: F)
where
    F: Fn(IngestTicket, Result<Bytes, IngestError>) + Clone + 'static,
{
    for (ticket, file) in reads {
        let on_done = on_done.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let result = read_file(&file).await;
            if let Err(err) = &result {
                tracing::debug!(%err, "file read failed");
            }
            on_done(ticket, result);
        });
    }
}
