use criterion::{Criterion, black_box, criterion_group, criterion_main};

use addrconfirm_core::PartnerKey;
use addrconfirm_partners::{Address, AddressHasher};
use addrconfirm_security::{
    AddressConfirmationToken, CipherAlgorithm, ConfirmationCipher, RsaConfirmationCipher,
    TokenCodec,
};

fn sample_address() -> Address {
    Address {
        partner: PartnerKey::new("17100001").unwrap(),
        street: "Dietmar-Hopp-Allee".to_string(),
        house_number: "16".to_string(),
        postal_code: "69190".to_string(),
        city: "Walldorf".to_string(),
        country: "DE".to_string(),
        region: "BW".to_string(),
    }
}

fn bench_hash_and_encode(c: &mut Criterion) {
    let address = sample_address();
    let token = AddressConfirmationToken::for_address(address.clone());

    c.bench_function("address_hash", |b| {
        b.iter(|| AddressHasher::hash(black_box(&address)))
    });
    c.bench_function("token_encode", |b| {
        b.iter(|| TokenCodec::encode(black_box(&token)).unwrap())
    });
}

fn bench_encrypt(c: &mut Criterion) {
    let cipher = RsaConfirmationCipher::generate(CipherAlgorithm::Rsa2048).unwrap();
    let token = AddressConfirmationToken::for_address(sample_address());
    let opaque = cipher.encrypt(&token).unwrap();

    c.bench_function("token_encrypt_rsa2048", |b| {
        b.iter(|| cipher.encrypt(black_box(&token)).unwrap())
    });
    c.bench_function("token_decrypt_rsa2048", |b| {
        b.iter(|| cipher.decrypt(black_box(&opaque)).unwrap())
    });
}

criterion_group!(benches, bench_hash_and_encode, bench_encrypt);
criterion_main!(benches);
