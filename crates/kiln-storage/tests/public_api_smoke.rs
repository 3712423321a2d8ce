//! Compile-test for the crate root: ensures public API symbols are re-exported.

#[test]
fn public_api_smoke_root_facade() {
    use kiln_storage::{
        ByteStore, ColumnMismatchKind, CsvFormat, CsvMatrixStore, DesignMatrix, FsStore,
        IndexKey, JsonCodec, Labels, LoadedMatrix, MatrixFormat, MatrixMetadata,
        MatrixStorageEngine, MatrixStore, MatrixType, ModelCodec, ModelStorageEngine,
        ObjectStoreByteStore, ProjectStorage, RootLocation, StorageConfig, StorageError,
        StorageResult,
    };

    fn assert_format<F: MatrixFormat>() {}
    fn assert_codec<C: ModelCodec>() {}
    fn assert_byte_store<B: ByteStore>() {}

    assert_format::<CsvFormat>();
    assert_codec::<JsonCodec<Vec<f64>>>();
    assert_byte_store::<FsStore>();
    assert_byte_store::<ObjectStoreByteStore>();

    // Symbols exist; no backend needed
    let _ = std::mem::size_of::<CsvMatrixStore>();
    let _ = std::mem::size_of::<MatrixStore<CsvFormat>>();
    let _ = std::mem::size_of::<MatrixStorageEngine>();
    let _ = std::mem::size_of::<ModelStorageEngine<JsonCodec<String>>>();
    let _ = std::mem::size_of::<DesignMatrix>();
    let _ = std::mem::size_of::<IndexKey>();
    let _ = std::mem::size_of::<Labels>();
    let _ = std::mem::size_of::<LoadedMatrix>();
    let _ = std::mem::size_of::<MatrixMetadata>();
    let _ = std::mem::size_of::<MatrixType>();
    let _ = std::mem::size_of::<ColumnMismatchKind>();
    let _ = std::mem::size_of::<RootLocation>();
    let _ = std::mem::size_of::<StorageConfig>();
    let _ = std::mem::size_of::<StorageError>();
    let _ = std::mem::size_of::<StorageResult<()>>();
    let _ = std::mem::size_of::<ProjectStorage>();
}
