// sphinx_decrypt_benchmark.rs - sphinx cryptographic packet format benchmarks
// Copyright (C) 2018  David Anthony Stainton.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

#[macro_use]
extern crate criterion;

use criterion::Criterion;
use rand::rngs::OsRng;
use rand::RngCore;

use sphinxcrypto::client::PathHop;
use sphinxcrypto::commands::{NodeDelay, Recipient, RoutingCommand};
use sphinxcrypto::constants::{FORWARD_PAYLOAD_SIZE, MAX_HOPS, NODE_ID_SIZE, RECIPIENT_ID_SIZE};
use sphinxcrypto::ecdh::PrivateKey;
use sphinxcrypto::nike::{NikeScheme, X25519Nike};
use sphinxcrypto::Sphinx;

fn new_path_vector(num_hops: usize) -> (Vec<PrivateKey>, Vec<PathHop>) {
    const DELAY_BASE: u32 = 123;
    let mut keys = Vec::with_capacity(num_hops);
    let mut path = Vec::with_capacity(num_hops);
    for i in 0..num_hops {
        let mut id = [0u8; NODE_ID_SIZE];
        OsRng.fill_bytes(&mut id);
        let (public_key, private_key) = X25519Nike.generate_keypair(&mut OsRng).unwrap();
        let command = if i < num_hops - 1 {
            RoutingCommand::NodeDelay(NodeDelay {
                delay: DELAY_BASE * (i as u32 + 1),
            })
        } else {
            let mut rcpt_id = [0u8; RECIPIENT_ID_SIZE];
            OsRng.fill_bytes(&mut rcpt_id);
            RoutingCommand::Recipient(Recipient { id: rcpt_id })
        };
        keys.push(private_key);
        path.push(PathHop {
            id,
            public_key,
            commands: vec![command],
        });
    }
    (keys, path)
}

fn criterion_sphinx_unwrap_benchmark(c: &mut Criterion) {
    let mut payload = vec![0u8; FORWARD_PAYLOAD_SIZE];
    let s = "We must defend our own privacy if we expect to have any. \
             We must come together and create systems which allow anonymous transactions to take place.";
    payload[..s.len()].copy_from_slice(s.as_bytes());

    let sphinx: Sphinx = Sphinx::default();
    let (keys, path) = new_path_vector(MAX_HOPS);
    let packet = sphinx.new_packet(&mut OsRng, &path, &payload).unwrap();

    c.bench_function("sphinx unwrap", move |b| {
        b.iter(|| sphinx.unwrap_packet(&keys[0], packet.clone()).unwrap())
    });
}

fn criterion_sphinx_create_benchmark(c: &mut Criterion) {
    let payload = vec![0u8; FORWARD_PAYLOAD_SIZE];
    let sphinx: Sphinx = Sphinx::default();
    let (_, path) = new_path_vector(MAX_HOPS);

    c.bench_function("sphinx new packet", move |b| {
        b.iter(|| sphinx.new_packet(&mut OsRng, &path, &payload).unwrap())
    });
}

criterion_group!(benches, criterion_sphinx_unwrap_benchmark, criterion_sphinx_create_benchmark);
criterion_main!(benches);
