use criterion::{criterion_group, criterion_main, Criterion};

use mailgunner::compose::{compose, SendRequest};
use mailgunner::model::address::AddressList;

fn address_list(n: usize) -> String {
    (0..n)
        .map(|i| match i % 4 {
            0 => format!("user{i}@example.com"),
            1 => format!("User {i} <user{i}@example.com>"),
            2 => format!("\"User {i}\" <user{i}@example.com>"),
            _ => format!("'User {i}'<user{i}@example.com>"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn bench_parse_addresses(c: &mut Criterion) {
    let raw = address_list(1000);

    c.bench_function("parse_1000_addresses", |b| {
        b.iter(|| AddressList::parse(&raw).len())
    });
}

fn bench_compose(c: &mut Criterion) {
    let request = SendRequest::new(address_list(1000), "Sender <sender@example.com>", "Hello")
        .html("<p>Hello</p>")
        .plain("Hello")
        .header("Cc", address_list(20))
        .header("X-Campaign", "bench");

    c.bench_function("compose_1000_recipients", |b| {
        b.iter(|| compose(&request, &[]).unwrap())
    });
}

criterion_group!(benches, bench_parse_addresses, bench_compose);
criterion_main!(benches);
