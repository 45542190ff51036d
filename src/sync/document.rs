//! Editor collaborator seams
//!
//! The document being edited and the commit-message prompt belong to the
//! front end. The sync operations see them only through these narrow
//! interfaces, injected per call rather than reached through shared state.

/// The document currently open in the editor.
///
/// Borrowed only for the duration of a save; the sync layer never holds on
/// to it.
pub trait EditorDocument: Send {
    /// The full serialized document text
    fn serialize(&self) -> String;

    /// Whether the document has unsaved changes
    fn is_dirty(&self) -> bool;

    /// Reload the document as the just-committed state, clearing the dirty
    /// flag
    fn mark_saved(&mut self, new_state: &str);
}

/// Commit-message prompt raised before every save.
pub trait CommitPrompt: Send + Sync {
    /// Ask for a commit message, offering `default`.
    ///
    /// None or an empty string aborts the save; that is a clean no-op, not
    /// an error.
    fn commit_message(&self, default: &str) -> Option<String>;
}
