use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde::Serialize;
use serde_form::{struct_tags, to_string, Encoder, TypeKey};
use std::collections::BTreeMap;

#[derive(Serialize, Clone)]
struct User {
    id: u32,
    name: String,
    email: String,
    active: bool,
}

#[derive(Serialize, Clone)]
struct Product {
    sku: String,
    name: String,
    price: f64,
    quantity: u32,
}

#[derive(Serialize, Clone)]
struct Cents(u64);

#[derive(Serialize, Clone)]
struct Order {
    id: u32,
    customer: User,
    items: Vec<Product>,
    total: Cents,
    metadata: BTreeMap<String, String>,
}

fn user() -> User {
    User {
        id: 123,
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        active: true,
    }
}

fn products(size: usize) -> Vec<Product> {
    (0..size)
        .map(|i| Product {
            sku: format!("SKU-{:04}", i),
            name: format!("Product {}", i),
            price: 10.0 + i as f64,
            quantity: (i % 10) as u32,
        })
        .collect()
}

fn order(size: usize) -> Order {
    let mut metadata = BTreeMap::new();
    metadata.insert("channel".to_string(), "web".to_string());
    metadata.insert("region".to_string(), "eu".to_string());
    Order {
        id: 1,
        customer: user(),
        items: products(size),
        total: Cents(19_999),
        metadata,
    }
}

fn benchmark_encode_simple(c: &mut Criterion) {
    let encoder = Encoder::new();
    let user = user();

    c.bench_function("encode_simple_struct", |b| {
        b.iter(|| encoder.encode(black_box(&user)))
    });
}

fn benchmark_encode_array(c: &mut Criterion) {
    let encoder = Encoder::new();
    let mut group = c.benchmark_group("encode_array");

    for size in [10, 50, 100, 500].iter() {
        let products = products(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &products, |b, products| {
            b.iter(|| encoder.encode(black_box(products)))
        });
    }
    group.finish();
}

fn benchmark_encode_configured(c: &mut Criterion) {
    let encoder = Encoder::builder()
        .struct_tags(struct_tags!(Order {
            customer: { form: "c" },
            metadata: { form: "meta,omitempty" },
        }))
        .register_fn(
            |v| {
                let cents = v.as_number().and_then(|n| n.as_i64()).unwrap_or(0);
                Ok(format!("{}.{:02}", cents / 100, cents % 100))
            },
            [TypeKey::named("Cents")],
        )
        .build();
    let order = order(20);

    c.bench_function("encode_configured_order", |b| {
        b.iter(|| encoder.encode_with_columns(black_box(&order)))
    });
}

fn benchmark_to_query_string(c: &mut Criterion) {
    let order = order(20);

    c.bench_function("to_query_string_order", |b| {
        b.iter(|| to_string(black_box(&order)))
    });
}

criterion_group!(
    benches,
    benchmark_encode_simple,
    benchmark_encode_array,
    benchmark_encode_configured,
    benchmark_to_query_string
);
criterion_main!(benches);
