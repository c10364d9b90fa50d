///
/// Cloner
///
/// Per-type replacement for the source system's reflection-based property
/// copier (design notes §9). `clone_into` copies every persisted member of
/// `src` onto `dst` without changing `dst`'s identity (its place in the
/// table's row store) — the update path uses this both to snapshot a
/// victim before mutation and to copy the updater's result back onto the
/// live row. Derive with `#[derive(rowcore_derive::Cloner)]` on any
/// named-field struct.
///
pub trait Cloner {
    fn clone_into(src: &Self, dst: &mut Self);
}
