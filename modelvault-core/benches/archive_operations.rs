use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use modelvault_core::{
    decode_from_bytes, encode_to_bytes, Archivable, ArchiveFormat, ArchiveResult, Archiver,
    ClassRegistry, CryptoArchive, KeyedDecoder, KeyedEncoder, Node, SchemeVersion,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
struct Label {
    name: String,
}

impl Archivable for Label {
    fn encode_with(&self, encoder: &mut KeyedEncoder) -> ArchiveResult<()> {
        encoder.encode_str("name", &self.name);
        Ok(())
    }

    fn decode_with(decoder: &KeyedDecoder) -> ArchiveResult<Self> {
        Ok(Label {
            name: decoder.decode_string("name")?,
        })
    }
}

#[derive(Debug)]
struct Task {
    title: String,
    done: bool,
    label: Arc<Label>,
}

impl Archivable for Task {
    fn encode_with(&self, encoder: &mut KeyedEncoder) -> ArchiveResult<()> {
        encoder.encode_str("title", &self.title);
        encoder.encode_bool("done", self.done);
        encoder.encode_object("label", &self.label);
        Ok(())
    }

    fn decode_with(decoder: &KeyedDecoder) -> ArchiveResult<Self> {
        Ok(Task {
            title: decoder.decode_string("title")?,
            done: decoder.decode_bool("done")?,
            label: decoder.decode_object("label")?,
        })
    }
}

#[derive(Debug)]
struct Board {
    tasks: Vec<Arc<Task>>,
}

impl Archivable for Board {
    fn encode_with(&self, encoder: &mut KeyedEncoder) -> ArchiveResult<()> {
        encoder.encode_objects("tasks", &self.tasks);
        Ok(())
    }

    fn decode_with(decoder: &KeyedDecoder) -> ArchiveResult<Self> {
        Ok(Board {
            tasks: decoder.decode_objects("tasks")?,
        })
    }
}

fn registry() -> ClassRegistry {
    let mut registry = ClassRegistry::new();
    registry
        .register::<Label>("Label")
        .register::<Task>("Task")
        .register::<Board>("Board");
    registry
}

/// `size` tasks spread over eight shared labels
fn board(size: usize) -> Node {
    let labels: Vec<_> = (0..8)
        .map(|i| Arc::new(Label { name: format!("label-{}", i) }))
        .collect();
    let tasks = (0..size)
        .map(|i| {
            Arc::new(Task {
                title: format!("task {}", i),
                done: i % 3 == 0,
                label: Arc::clone(&labels[i % labels.len()]),
            })
        })
        .collect();
    Node::object(&Arc::new(Board { tasks }))
}

fn bench_archive_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("archive_graph");
    let registry = registry();
    let archiver = Archiver::new(&registry);

    for size in [10, 100, 1000] {
        let root = board(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("encode", size), &root, |b, root| {
            b.iter(|| black_box(archiver.encode(root).unwrap()));
        });

        let value = archiver.encode(&root).unwrap();
        group.bench_with_input(BenchmarkId::new("decode", size), &value, |b, value| {
            b.iter(|| black_box(archiver.decode(value).unwrap()));
        });
    }

    group.finish();
}

fn bench_codecs(c: &mut Criterion) {
    let mut group = c.benchmark_group("codecs");
    let registry = registry();
    let archiver = Archiver::new(&registry);
    let root = board(500);

    for format in [ArchiveFormat::Json, ArchiveFormat::Binary] {
        let codec = format.codec();
        let bytes = encode_to_bytes(&archiver, &root, codec.as_ref()).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_function(BenchmarkId::new("to_bytes", format), |b| {
            b.iter(|| black_box(encode_to_bytes(&archiver, &root, codec.as_ref()).unwrap()));
        });
        group.bench_function(BenchmarkId::new("from_bytes", format), |b| {
            b.iter(|| black_box(decode_from_bytes(&archiver, &bytes, codec.as_ref()).unwrap()));
        });
    }

    group.finish();
}

fn bench_seal_open(c: &mut Criterion) {
    let mut group = c.benchmark_group("crypto_archive");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(10));
    let payload = vec![0x5au8; 64 * 1024];

    for version in SchemeVersion::ALL {
        group.bench_function(BenchmarkId::new("seal", version), |b| {
            b.iter(|| black_box(CryptoArchive::seal_with_version(&payload, "bench", None, version).unwrap()));
        });

        let sealed = CryptoArchive::seal_with_version(&payload, "bench", None, version).unwrap();
        group.bench_function(BenchmarkId::new("open", version), |b| {
            b.iter(|| black_box(sealed.open("bench").unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_archive_graph, bench_codecs, bench_seal_open);
criterion_main!(benches);
