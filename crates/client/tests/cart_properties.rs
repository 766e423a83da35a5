//! Cart invariants over arbitrary operation sequences.

use std::sync::Arc;

use hotmeal_client::{CartItem, CartModel, MemoryStorage};
use hotmeal_core::{DishId, Price};
use proptest::collection::vec;
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Op {
    Add(i32),
    Increase(i32),
    Decrease(i32),
    Remove(i32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let id = 1..6_i32;
    prop_oneof![
        4 => id.clone().prop_map(Op::Add),
        2 => id.clone().prop_map(Op::Increase),
        2 => id.clone().prop_map(Op::Decrease),
        1 => id.prop_map(Op::Remove),
    ]
}

fn item(id: i32) -> CartItem {
    CartItem {
        item_id: DishId::new(id),
        name: format!("Dish {id}"),
        unit_price: Price::from_cents(id.unsigned_abs() * 150),
        image_ref: None,
    }
}

/// Reference cart: `(id, quantity)` in insertion order.
fn apply(model: &mut Vec<(i32, u32)>, op: Op) {
    match op {
        Op::Add(id) => match model.iter_mut().find(|(i, _)| *i == id) {
            Some((_, q)) => *q += 1,
            None => model.push((id, 1)),
        },
        Op::Increase(id) => {
            if let Some((_, q)) = model.iter_mut().find(|(i, _)| *i == id) {
                *q += 1;
            }
        }
        Op::Decrease(id) => {
            if let Some(pos) = model.iter().position(|(i, _)| *i == id) {
                if model[pos].1 > 1 {
                    model[pos].1 -= 1;
                } else {
                    model.remove(pos);
                }
            }
        }
        Op::Remove(id) => model.retain(|(i, _)| *i != id),
    }
}

fn run(cart: &mut CartModel, op: Op) {
    match op {
        Op::Add(id) => cart.add_item(item(id)).expect("add"),
        Op::Increase(id) => {
            cart.increase(DishId::new(id)).expect("increase");
        }
        Op::Decrease(id) => {
            cart.decrease(DishId::new(id)).expect("decrease");
        }
        Op::Remove(id) => {
            cart.remove(DishId::new(id)).expect("remove");
        }
    }
}

fn summary(cart: &CartModel) -> Vec<(i32, u32)> {
    cart.lines()
        .iter()
        .map(|l| (l.item_id.as_i32(), l.quantity))
        .collect()
}

proptest! {
    #[test]
    fn cart_matches_reference_after_any_sequence(ops in vec(op_strategy(), 0..64)) {
        let storage = Arc::new(MemoryStorage::new());
        let mut cart = CartModel::restore(storage).expect("restore");
        let mut model = Vec::new();

        for op in ops {
            run(&mut cart, op);
            apply(&mut model, op);
        }

        prop_assert_eq!(summary(&cart), model.clone());
        prop_assert!(cart.lines().iter().all(|l| l.quantity > 0));
        prop_assert_eq!(cart.total_count(), model.iter().map(|(_, q)| q).sum::<u32>());

        let expected: Price = model
            .iter()
            .map(|(id, q)| item(*id).unit_price.times(*q))
            .sum();
        prop_assert_eq!(cart.total_price(), expected);
    }

    #[test]
    fn only_adds_yield_one_line_per_id_with_net_count(ids in vec(1..6_i32, 0..48)) {
        let storage = Arc::new(MemoryStorage::new());
        let mut cart = CartModel::restore(storage).expect("restore");
        for id in &ids {
            cart.add_item(item(*id)).expect("add");
        }

        let mut first_seen: Vec<i32> = Vec::new();
        for id in &ids {
            if !first_seen.contains(id) {
                first_seen.push(*id);
            }
        }
        let line_ids: Vec<i32> = cart.lines().iter().map(|l| l.item_id.as_i32()).collect();
        prop_assert_eq!(line_ids, first_seen.clone());
        for id in first_seen {
            let count = ids.iter().filter(|i| **i == id).count();
            prop_assert_eq!(cart.quantity_of(DishId::new(id)) as usize, count);
        }
    }

    #[test]
    fn restore_reproduces_lines(ops in vec(op_strategy(), 0..64)) {
        let storage = Arc::new(MemoryStorage::new());
        let mut cart = CartModel::restore(storage.clone()).expect("restore");
        for op in ops {
            run(&mut cart, op);
        }

        let reloaded = CartModel::restore(storage).expect("reload");
        prop_assert_eq!(reloaded.lines(), cart.lines());
    }
}
